pub mod message;
pub mod order;
pub mod order_item;
pub mod page_content;
pub mod product;
pub mod review;
pub mod user;
