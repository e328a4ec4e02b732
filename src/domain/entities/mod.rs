pub mod analytics;
pub mod client;
pub mod purchase;
pub mod service;
pub mod ticket;
pub mod user;
