pub mod error;

pub use error::{CrosstableError, Result};
