pub mod ai;
pub mod http;
pub mod persistence;
