use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Order lifecycle status, stored as its uppercase name in the `status`
/// column. Transitions are not validated anywhere; any value can be assigned
/// at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "PAID" => Ok(OrderStatus::Paid),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(Error::UnknownOrderStatus(other.to_string())),
        }
    }
}

/// `id` and `created_at` stay `None` until the row is inserted; both are
/// assigned by the database and `created_at` is never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            created_at: None,
        }
    }
}

impl PartialEq for User {
    /// Identity equality: two users are the same entity iff their primary
    /// keys match. Unsaved users have no key and never compare equal.
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal, stock: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            stock,
            created_at: None,
        }
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// A line in an order. The `subtotal` is supplied by the caller (expected to
/// be price x quantity at insertion time) and is never recalculated here.
/// `order_id` is the back-reference maintained by [`Order::add_item`] and
/// the remove helpers; don't set it by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Option<i64>,
    pub quantity: i32,
    pub subtotal: Option<Decimal>,
    pub order_id: Option<i64>,
    pub product_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl OrderItem {
    pub fn new(quantity: i32, product_id: i64) -> Self {
        Self {
            id: None,
            quantity,
            subtotal: None,
            order_id: None,
            product_id,
            created_at: None,
        }
    }
}

impl PartialEq for OrderItem {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// An order and the items it owns. The item collection is private on
/// purpose: both sides of the order/item link stay consistent only when
/// mutation goes through [`Order::add_item`] and the remove helpers, and
/// orphan removal relies on the ledger those helpers keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub user_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    items: Vec<OrderItem>,
    #[serde(skip)]
    removed_item_ids: Vec<i64>,
}

impl Order {
    pub fn new(total: Decimal, user_id: i64) -> Self {
        Self {
            id: None,
            total,
            status: OrderStatus::Created,
            user_id,
            created_at: None,
            items: Vec::new(),
            removed_item_ids: Vec::new(),
        }
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Add an item and rewrite its back-reference so both sides of the
    /// relationship agree. For an unsaved order the back-reference stays
    /// `None` until the order is inserted.
    pub fn add_item(&mut self, mut item: OrderItem) {
        item.order_id = self.id;
        self.items.push(item);
    }

    /// Detach the item at `index`, clearing its back-reference. If the item
    /// was already persisted it is recorded for deletion at the next save.
    pub fn remove_item_at(&mut self, index: usize) -> Option<OrderItem> {
        if index >= self.items.len() {
            return None;
        }
        let mut item = self.items.remove(index);
        item.order_id = None;
        if let Some(id) = item.id {
            self.removed_item_ids.push(id);
        }
        Some(item)
    }

    /// Detach a persisted item by its id. Same orphan bookkeeping as
    /// [`Order::remove_item_at`].
    pub fn remove_item_by_id(&mut self, item_id: i64) -> Option<OrderItem> {
        let index = self.items.iter().position(|i| i.id == Some(item_id))?;
        self.remove_item_at(index)
    }

    /// Ids of detached items awaiting orphan removal at the next save.
    pub fn removed_item_ids(&self) -> &[i64] {
        &self.removed_item_ids
    }

    /// Replace the item collection with rows loaded from storage. Used by the
    /// repository after fetch/persist, when both sides are known consistent.
    pub(crate) fn attach_items(&mut self, items: Vec<OrderItem>) {
        self.items = items;
        self.removed_item_ids.clear();
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// A product review. The composite key (user_id, product_id) is the full
/// identity; there is no surrogate id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReview {
    pub user_id: i64,
    pub product_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductReview {
    pub fn new(user_id: i64, product_id: i64, rating: i32, comment: Option<String>) -> Self {
        Self {
            user_id,
            product_id,
            rating,
            comment,
            created_at: None,
        }
    }
}

impl PartialEq for ProductReview {
    /// Composite-key equality: the (user_id, product_id) pair alone decides
    /// identity, regardless of rating or comment.
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id && self.product_id == other.product_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: Option<i64>, name: &str, email: &str) -> User {
        User {
            id,
            name: name.into(),
            email: email.into(),
            created_at: None,
        }
    }

    #[test]
    fn user_equality_compares_primary_keys_only() {
        let a = user(Some(1), "Ana", "ana@x.com");
        let b = user(Some(1), "Renamed", "other@x.com");
        let c = user(Some(2), "Ana", "ana@x.com");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unsaved_users_never_compare_equal() {
        let a = user(None, "Ana", "ana@x.com");
        let b = user(None, "Ana", "ana@x.com");
        assert_ne!(a, b);
    }

    #[test]
    fn review_equality_uses_composite_key() {
        let a = ProductReview::new(1, 2, 5, Some("great".into()));
        let b = ProductReview::new(1, 2, 1, None);
        let c = ProductReview::new(1, 3, 5, Some("great".into()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn add_item_sets_back_reference_on_saved_order() {
        let mut order = Order::new(Decimal::new(5000, 2), 1);
        order.id = Some(7);
        order.add_item(OrderItem::new(1, 42));
        assert_eq!(order.items()[0].order_id, Some(7));
        assert_eq!(order.items()[0].product_id, 42);
    }

    #[test]
    fn add_item_on_unsaved_order_leaves_back_reference_unset() {
        let mut order = Order::new(Decimal::new(5000, 2), 1);
        order.add_item(OrderItem::new(2, 42));
        assert_eq!(order.items()[0].order_id, None);
    }

    #[test]
    fn remove_item_clears_back_reference_and_records_orphan() {
        let mut order = Order::new(Decimal::new(5000, 2), 1);
        order.id = Some(7);
        let mut item = OrderItem::new(1, 42);
        item.id = Some(3);
        order.add_item(item);

        let removed = order.remove_item_by_id(3).expect("item present");
        assert_eq!(removed.order_id, None);
        assert!(order.items().is_empty());
        assert_eq!(order.removed_item_ids(), &[3]);
    }

    #[test]
    fn removing_an_unsaved_item_records_no_orphan() {
        let mut order = Order::new(Decimal::new(5000, 2), 1);
        order.add_item(OrderItem::new(1, 42));
        let removed = order.remove_item_at(0).expect("item present");
        assert_eq!(removed.order_id, None);
        assert!(order.removed_item_ids().is_empty());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            OrderStatus::Created,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }
}
