pub mod error;

pub use error::{DispatchError, PratError, Result};
