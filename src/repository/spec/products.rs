use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::products;

pub fn name_contains(name: &str) -> Condition {
    let pattern = format!("%{name}%");
    Condition::all().add(Expr::col(products::Column::Name).ilike(pattern))
}

pub fn price_greater_than(price: Decimal) -> Condition {
    Condition::all().add(products::Column::Price.gt(price))
}

pub fn price_less_than(price: Decimal) -> Condition {
    Condition::all().add(products::Column::Price.lt(price))
}

pub fn price_between(min: Option<Decimal>, max: Option<Decimal>) -> Condition {
    let mut cond = Condition::all();
    if let Some(min) = min {
        cond = cond.add(products::Column::Price.gte(min));
    }
    if let Some(max) = max {
        cond = cond.add(products::Column::Price.lte(max));
    }
    cond
}

pub fn has_stock() -> Condition {
    Condition::all().add(products::Column::Stock.gt(0))
}

pub fn low_stock(threshold: i32) -> Condition {
    Condition::all().add(products::Column::Stock.lte(threshold))
}

pub fn out_of_stock() -> Condition {
    Condition::all().add(products::Column::Stock.eq(0))
}
