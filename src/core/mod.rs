pub mod error;

pub use error::{DeletionError, Result};
