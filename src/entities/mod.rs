pub mod order;
pub mod order_item;
pub mod product;
pub mod product_movement;
pub mod stock;
pub mod warehouse;
