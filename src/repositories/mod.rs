// Repositories module - data access layer

pub mod cuisine_repository;
pub mod table_manager;

pub use cuisine_repository::{CuisineRepository, DynamoDbCuisineRepository};
pub use table_manager::TableManager;
