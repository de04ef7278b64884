pub mod error;
pub mod events;
pub mod lifecycle;
pub mod ordering;
pub mod partition;
pub mod ports;
pub mod reports;
pub mod repo;
pub mod service;
