use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QuerySelect, RelationTrait, Set,
};

use crate::{
    db::Db,
    entity::{
        product_reviews::{
            self, ActiveModel as ReviewActive, Column, Entity as ProductReviews,
            Model as ReviewModel,
        },
        products::Column as ProductCol,
        users::Column as UserCol,
    },
    error::{Error, Result},
    models::ProductReview,
};

/// A second insert for the same (user, product) pair fails with the
/// composite-key unique violation, propagated untranslated.
pub async fn insert(db: &Db, review: &ProductReview) -> Result<ProductReview> {
    let active = ReviewActive {
        user_id: Set(review.user_id),
        product_id: Set(review.product_id),
        rating: Set(review.rating),
        comment: Set(review.comment.clone()),
        created_at: NotSet,
    };
    let model = active.insert(&db.orm).await?;
    Ok(review_from_entity(model))
}

pub async fn update(db: &Db, review: &ProductReview) -> Result<ProductReview> {
    let existing = ProductReviews::find_by_id((review.user_id, review.product_id))
        .one(&db.orm)
        .await?
        .ok_or(Error::NotFound)?;
    let mut active: ReviewActive = existing.into();
    active.rating = Set(review.rating);
    active.comment = Set(review.comment.clone());
    let model = active.update(&db.orm).await?;
    Ok(review_from_entity(model))
}

pub async fn find_by_id(db: &Db, user_id: i64, product_id: i64) -> Result<Option<ProductReview>> {
    let review = ProductReviews::find_by_id((user_id, product_id))
        .one(&db.orm)
        .await?;
    Ok(review.map(review_from_entity))
}

pub async fn delete(db: &Db, user_id: i64, product_id: i64) -> Result<()> {
    ProductReviews::delete_by_id((user_id, product_id))
        .exec(&db.orm)
        .await?;
    Ok(())
}

pub async fn find_by_user(db: &Db, user_id: i64) -> Result<Vec<ProductReview>> {
    let reviews = ProductReviews::find()
        .filter(Column::UserId.eq(user_id))
        .all(&db.orm)
        .await?;
    Ok(reviews.into_iter().map(review_from_entity).collect())
}

pub async fn find_by_product(db: &Db, product_id: i64) -> Result<Vec<ProductReview>> {
    let reviews = ProductReviews::find()
        .filter(Column::ProductId.eq(product_id))
        .all(&db.orm)
        .await?;
    Ok(reviews.into_iter().map(review_from_entity).collect())
}

pub async fn exists_for(db: &Db, user_id: i64, product_id: i64) -> Result<bool> {
    let count = ProductReviews::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::ProductId.eq(product_id))
        .count(&db.orm)
        .await?;
    Ok(count > 0)
}

pub async fn find_by_rating_at_least(db: &Db, min_rating: i32) -> Result<Vec<ProductReview>> {
    let reviews = ProductReviews::find()
        .filter(Column::Rating.gte(min_rating))
        .all(&db.orm)
        .await?;
    Ok(reviews.into_iter().map(review_from_entity).collect())
}

pub async fn find_high_rated(
    db: &Db,
    product_id: i64,
    min_rating: i32,
) -> Result<Vec<ProductReview>> {
    let reviews = ProductReviews::find()
        .filter(Column::ProductId.eq(product_id))
        .filter(Column::Rating.gte(min_rating))
        .all(&db.orm)
        .await?;
    Ok(reviews.into_iter().map(review_from_entity).collect())
}

/// Mean rating for a product; `None` when it has no reviews.
pub async fn average_rating(db: &Db, product_id: i64) -> Result<Option<Decimal>> {
    let avg = ProductReviews::find()
        .select_only()
        .expr_as(Func::avg(Expr::col(Column::Rating)), "average_rating")
        .filter(Column::ProductId.eq(product_id))
        .into_tuple::<Option<Decimal>>()
        .one(&db.orm)
        .await?;
    Ok(avg.flatten())
}

/// A review joined with the names of its user and product.
#[derive(Debug, FromQueryResult)]
pub struct ReviewDetail {
    pub user_id: i64,
    pub product_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub user_name: String,
    pub product_name: String,
}

pub async fn find_with_user_and_product(db: &Db, product_id: i64) -> Result<Vec<ReviewDetail>> {
    let rows = ProductReviews::find()
        .select_only()
        .column(Column::UserId)
        .column(Column::ProductId)
        .column(Column::Rating)
        .column(Column::Comment)
        .column_as(UserCol::Name, "user_name")
        .column_as(ProductCol::Name, "product_name")
        .join(JoinType::InnerJoin, product_reviews::Relation::Users.def())
        .join(JoinType::InnerJoin, product_reviews::Relation::Products.def())
        .filter(Column::ProductId.eq(product_id))
        .into_model::<ReviewDetail>()
        .all(&db.orm)
        .await?;
    Ok(rows)
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    user_id: i64,
    product_id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl From<ReviewRow> for ProductReview {
    fn from(row: ReviewRow) -> Self {
        ProductReview {
            user_id: row.user_id,
            product_id: row.product_id,
            rating: row.rating,
            comment: row.comment,
            created_at: Some(row.created_at),
        }
    }
}

/// Aggregate rating figures for one product.
#[derive(Debug, sqlx::FromRow)]
pub struct ReviewStatistics {
    pub review_count: i64,
    pub average_rating: Option<Decimal>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TopRatedProduct {
    pub product_id: i64,
    pub name: String,
    pub average_rating: Decimal,
    pub review_count: i64,
}

pub async fn find_by_product_native(db: &Db, product_id: i64) -> Result<Vec<ProductReview>> {
    let rows: Vec<ReviewRow> = sqlx::query_as(
        "SELECT user_id, product_id, rating, comment, created_at \
         FROM product_reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows.into_iter().map(ProductReview::from).collect())
}

pub async fn review_statistics(db: &Db, product_id: i64) -> Result<ReviewStatistics> {
    let stats: ReviewStatistics = sqlx::query_as(
        "SELECT COUNT(*) AS review_count, AVG(rating) AS average_rating, \
                MIN(rating) AS min_rating, MAX(rating) AS max_rating \
         FROM product_reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(&db.pool)
    .await?;
    Ok(stats)
}

/// Products with at least three reviews, ranked by mean rating.
pub async fn top_rated_products(db: &Db, limit: i64) -> Result<Vec<TopRatedProduct>> {
    let rows: Vec<TopRatedProduct> = sqlx::query_as(
        "SELECT p.id AS product_id, p.name, AVG(pr.rating) AS average_rating, \
                COUNT(*) AS review_count \
         FROM product_reviews pr \
         JOIN products p ON pr.product_id = p.id \
         GROUP BY p.id, p.name \
         HAVING COUNT(*) >= 3 \
         ORDER BY average_rating DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub(crate) fn review_from_entity(model: ReviewModel) -> ProductReview {
    ProductReview {
        user_id: model.user_id,
        product_id: model.product_id,
        rating: model.rating,
        comment: model.comment,
        created_at: Some(model.created_at.with_timezone(&Utc)),
    }
}
