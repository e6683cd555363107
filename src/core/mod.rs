pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use error::{DbError, DriverError, Result};
pub use row::Row;
pub use types::{ColumnDef, ColumnType, Constraints, PrimaryKey, PrimaryValue};
pub use value::{FromValue, Value};
