//! Domain models for the checkout backend.

pub mod order;
pub mod product;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use product::Product;
