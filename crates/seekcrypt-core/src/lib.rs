pub mod config;
pub mod error;

pub use config::SeekcryptConfig;
pub use error::{SeekcryptError, SeekcryptResult};
