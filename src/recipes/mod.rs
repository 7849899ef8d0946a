pub mod dto;
mod forms;
mod handlers;
pub mod repo;
pub mod services;

pub use handlers::router;
