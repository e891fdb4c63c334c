//! Single-resource services exposed next to order placement.

mod cache;
mod point;
mod product;
mod stock;

pub use point::PointService;
pub use product::ProductService;
pub use stock::StockService;
