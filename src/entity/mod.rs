pub mod order_items;
pub mod orders;
pub mod product_reviews;
pub mod products;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_reviews::Entity as ProductReviews;
pub use products::Entity as Products;
pub use users::Entity as Users;
