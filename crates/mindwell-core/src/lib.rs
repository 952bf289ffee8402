pub mod config;
pub mod error;
pub mod types;

pub use config::MindwellConfig;
pub use error::{MindwellError, Result};
pub use types::*;
