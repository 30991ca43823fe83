use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::{
    db::Db,
    entity::{
        orders::Entity as Orders,
        users::{ActiveModel as UserActive, Column, Entity as Users, Model as UserModel},
    },
    error::{Error, Result},
    models::{Order, User},
    repository::spec,
};

pub async fn insert(db: &Db, user: &User) -> Result<User> {
    let active = UserActive {
        id: NotSet,
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        created_at: NotSet,
    };
    let model = active.insert(&db.orm).await?;
    Ok(user_from_entity(model))
}

/// Updates name and email; `created_at` is left untouched so it never appears
/// in the UPDATE statement.
pub async fn update(db: &Db, user: &User) -> Result<User> {
    let id = user.id.ok_or(Error::NotFound)?;
    let existing = Users::find_by_id(id)
        .one(&db.orm)
        .await?
        .ok_or(Error::NotFound)?;
    let mut active: UserActive = existing.into();
    active.name = Set(user.name.clone());
    active.email = Set(user.email.clone());
    let model = active.update(&db.orm).await?;
    Ok(user_from_entity(model))
}

pub async fn find_by_id(db: &Db, id: i64) -> Result<Option<User>> {
    let user = Users::find_by_id(id).one(&db.orm).await?;
    Ok(user.map(user_from_entity))
}

pub async fn find_all(db: &Db) -> Result<Vec<User>> {
    let users = Users::find().all(&db.orm).await?;
    Ok(users.into_iter().map(user_from_entity).collect())
}

/// The database cascades the delete to the user's orders (and their items)
/// and reviews.
pub async fn delete(db: &Db, id: i64) -> Result<()> {
    Users::delete_by_id(id).exec(&db.orm).await?;
    Ok(())
}

pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<User>> {
    let user = Users::find()
        .filter(Column::Email.eq(email))
        .one(&db.orm)
        .await?;
    Ok(user.map(user_from_entity))
}

pub async fn exists_by_email(db: &Db, email: &str) -> Result<bool> {
    let count = Users::find()
        .filter(Column::Email.eq(email))
        .count(&db.orm)
        .await?;
    Ok(count > 0)
}

pub async fn find_by_name_containing(db: &Db, name: &str) -> Result<Vec<User>> {
    let pattern = format!("%{name}%");
    let users = Users::find()
        .filter(Expr::col(Column::Name).ilike(pattern))
        .all(&db.orm)
        .await?;
    Ok(users.into_iter().map(user_from_entity).collect())
}

pub async fn find_created_after(db: &Db, cutoff: DateTime<Utc>) -> Result<Vec<User>> {
    let users = Users::find()
        .filter(Column::CreatedAt.gt(cutoff))
        .all(&db.orm)
        .await?;
    Ok(users.into_iter().map(user_from_entity).collect())
}

/// Users that have at least one order, each with their orders loaded. The
/// returned orders carry empty item collections; load items through the
/// orders repository when needed.
pub async fn find_with_orders(db: &Db) -> Result<Vec<(User, Vec<Order>)>> {
    let rows = Users::find()
        .filter(spec::users::has_orders())
        .find_with_related(Orders)
        .all(&db.orm)
        .await?;
    rows.into_iter()
        .map(|(user, orders)| {
            let orders = orders
                .into_iter()
                .map(super::orders::order_from_entity)
                .collect::<Result<Vec<_>>>()?;
            Ok((user_from_entity(user), orders))
        })
        .collect()
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Some(row.id),
            name: row.name,
            email: row.email,
            created_at: Some(row.created_at),
        }
    }
}

pub async fn find_by_email_native(db: &Db, email: &str) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT id, name, email, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&db.pool)
            .await?;
    Ok(row.map(User::from))
}

pub async fn count_registered_in_month(db: &Db, month: i32, year: i32) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users \
         WHERE EXTRACT(MONTH FROM created_at)::int = $1 \
           AND EXTRACT(YEAR FROM created_at)::int = $2",
    )
    .bind(month)
    .bind(year)
    .fetch_one(&db.pool)
    .await?;
    Ok(count)
}

pub async fn search_by_name(db: &Db, term: &str) -> Result<Vec<User>> {
    let pattern = format!("%{term}%");
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT id, name, email, created_at FROM users WHERE name ILIKE $1 ORDER BY name",
    )
    .bind(pattern)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows.into_iter().map(User::from).collect())
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: Some(model.id),
        name: model.name,
        email: model.email,
        created_at: Some(model.created_at.with_timezone(&Utc)),
    }
}
