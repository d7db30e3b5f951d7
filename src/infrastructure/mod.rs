pub mod models;
pub mod order_repo;
pub mod product_client;

pub use order_repo::DieselOrderRepository;
pub use product_client::HttpProductCatalog;
