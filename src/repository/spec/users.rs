use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, Condition};

use crate::entity::{orders, users};

pub fn has_email(email: &str) -> Condition {
    Condition::all().add(users::Column::Email.eq(email))
}

pub fn name_contains(name: &str) -> Condition {
    let pattern = format!("%{name}%");
    Condition::all().add(Expr::col(users::Column::Name).ilike(pattern))
}

pub fn created_after(date: DateTime<Utc>) -> Condition {
    Condition::all().add(users::Column::CreatedAt.gt(date))
}

pub fn created_before(date: DateTime<Utc>) -> Condition {
    Condition::all().add(users::Column::CreatedAt.lt(date))
}

pub fn created_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Condition {
    let mut cond = Condition::all();
    if let Some(start) = start {
        cond = cond.add(users::Column::CreatedAt.gte(start));
    }
    if let Some(end) = end {
        cond = cond.add(users::Column::CreatedAt.lte(end));
    }
    cond
}

/// Users with at least one order.
pub fn has_orders() -> Condition {
    Condition::all().add(
        users::Column::Id.in_subquery(
            Query::select()
                .column(orders::Column::UserId)
                .from(orders::Entity)
                .to_owned(),
        ),
    )
}
