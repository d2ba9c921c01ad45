pub mod error;
pub mod types;

pub use error::BridgeError;
pub use types::*;
