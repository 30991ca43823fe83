use rust_decimal::Decimal;
use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, Condition};

use crate::entity::{order_items, orders};

pub fn by_order(order_id: i64) -> Condition {
    Condition::all().add(order_items::Column::OrderId.eq(order_id))
}

pub fn by_product(product_id: i64) -> Condition {
    Condition::all().add(order_items::Column::ProductId.eq(product_id))
}

pub fn quantity_greater_than(quantity: i32) -> Condition {
    Condition::all().add(order_items::Column::Quantity.gt(quantity))
}

pub fn subtotal_greater_than(subtotal: Decimal) -> Condition {
    Condition::all().add(order_items::Column::Subtotal.gt(subtotal))
}

/// Items on any of the user's orders, reached through the parent table.
pub fn by_user(user_id: i64) -> Condition {
    Condition::all().add(
        order_items::Column::OrderId.in_subquery(
            Query::select()
                .column(orders::Column::Id)
                .from(orders::Entity)
                .and_where(orders::Column::UserId.eq(user_id))
                .to_owned(),
        ),
    )
}
