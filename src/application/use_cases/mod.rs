pub mod analytics;
pub mod chat;
pub mod client;
pub mod purchase;
pub mod service;
pub mod ticket;
pub mod user;
