pub mod config;
pub mod error;
pub mod persona;

pub use config::Config;
pub use error::*;
