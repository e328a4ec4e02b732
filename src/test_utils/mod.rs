//! Test utilities.
//!
//! - Test data factories for valid fixtures
//! - One in-memory store implementing every repository trait
//! - A scripted completion client
//! - `TestAppStateBuilder` for HTTP-level tests

mod app_state_builder;
mod completion;
mod factories;
mod store;

pub use app_state_builder::*;
pub use completion::*;
pub use factories::*;
pub use store::*;
