pub mod args;
pub mod commands;
mod config;
mod error;
mod import;
pub mod model;
pub mod pnl;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::Result;
