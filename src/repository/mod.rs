use sea_orm::{Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter};

use crate::db::Db;
use crate::error::Result;

pub mod order_items;
pub mod orders;
pub mod product_reviews;
pub mod products;
pub mod spec;
pub mod users;

/// Run a dynamically composed predicate against any entity. Predicates come
/// from the [`spec`] modules and compose with `Condition::all()` /
/// `Condition::any()`.
pub async fn find_where<E>(db: &Db, condition: Condition) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    Ok(E::find().filter(condition).all(&db.orm).await?)
}

pub async fn find_one_where<E>(db: &Db, condition: Condition) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    Ok(E::find().filter(condition).one(&db.orm).await?)
}

pub async fn count_where<E>(db: &Db, condition: Condition) -> Result<u64>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    Ok(E::find().filter(condition).count(&db.orm).await?)
}

pub async fn exists_where<E>(db: &Db, condition: Condition) -> Result<bool>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    Ok(find_one_where::<E>(db, condition).await?.is_some())
}
