pub mod app_error;
pub mod authz;
pub mod jwt;
pub mod pagination;
pub mod ports;
pub mod use_cases;
pub mod validators;
