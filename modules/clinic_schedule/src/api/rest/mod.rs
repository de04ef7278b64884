pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod problem;
pub mod routes;
