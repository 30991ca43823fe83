use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::orders;
use crate::models::OrderStatus;

pub fn by_user(user_id: i64) -> Condition {
    Condition::all().add(orders::Column::UserId.eq(user_id))
}

pub fn by_status(status: OrderStatus) -> Condition {
    Condition::all().add(orders::Column::Status.eq(status.as_str()))
}

pub fn created_after(date: DateTime<Utc>) -> Condition {
    Condition::all().add(orders::Column::CreatedAt.gt(date))
}

pub fn created_before(date: DateTime<Utc>) -> Condition {
    Condition::all().add(orders::Column::CreatedAt.lt(date))
}

pub fn created_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Condition {
    let mut cond = Condition::all();
    if let Some(start) = start {
        cond = cond.add(orders::Column::CreatedAt.gte(start));
    }
    if let Some(end) = end {
        cond = cond.add(orders::Column::CreatedAt.lte(end));
    }
    cond
}

pub fn total_greater_than(total: Decimal) -> Condition {
    Condition::all().add(orders::Column::Total.gt(total))
}

pub fn total_less_than(total: Decimal) -> Condition {
    Condition::all().add(orders::Column::Total.lt(total))
}

pub fn total_between(min: Option<Decimal>, max: Option<Decimal>) -> Condition {
    let mut cond = Condition::all();
    if let Some(min) = min {
        cond = cond.add(orders::Column::Total.gte(min));
    }
    if let Some(max) = max {
        cond = cond.add(orders::Column::Total.lte(max));
    }
    cond
}
