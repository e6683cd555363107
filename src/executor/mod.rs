//! Statement execution over a single [`Driver`](crate::connection::Driver).

mod executor;
pub mod sql;
mod transaction;

pub use executor::Executor;
pub use sql::{Statement, build_delete, build_insert, build_update};
