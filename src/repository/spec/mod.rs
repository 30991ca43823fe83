//! Composable query predicates, one module per entity.
//!
//! Each function returns a [`sea_orm::Condition`] so callers can combine
//! them freely:
//!
//! ```ignore
//! let cond = Condition::all()
//!     .add(spec::products::name_contains("mouse"))
//!     .add(spec::products::has_stock());
//! let hits = repository::find_where::<entity::Products>(&db, cond).await?;
//! ```
//!
//! Range helpers take `Option` bounds and simply contribute nothing for a
//! missing side, so a fully-`None` call is a no-op predicate.

pub mod order_items;
pub mod orders;
pub mod product_reviews;
pub mod products;
pub mod users;
