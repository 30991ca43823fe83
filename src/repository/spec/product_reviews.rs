use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::product_reviews;

pub fn by_user(user_id: i64) -> Condition {
    Condition::all().add(product_reviews::Column::UserId.eq(user_id))
}

pub fn by_product(product_id: i64) -> Condition {
    Condition::all().add(product_reviews::Column::ProductId.eq(product_id))
}

pub fn rating_at_least(rating: i32) -> Condition {
    Condition::all().add(product_reviews::Column::Rating.gte(rating))
}

pub fn has_comment() -> Condition {
    Condition::all()
        .add(product_reviews::Column::Comment.is_not_null())
        .add(product_reviews::Column::Comment.ne(""))
}

pub fn comment_contains(text: &str) -> Condition {
    let pattern = format!("%{text}%");
    Condition::all().add(Expr::col(product_reviews::Column::Comment).ilike(pattern))
}
