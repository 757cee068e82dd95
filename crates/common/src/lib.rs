//! JWT Pizza Common Library
//!
//! Domain model and fixed reference data shared by the mock backend and the
//! E2E harness.

pub mod error;
pub mod fixtures;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
