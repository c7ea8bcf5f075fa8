// Services module - business logic layer

pub mod cuisine_service;

pub use cuisine_service::CuisineService;
