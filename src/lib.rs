pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod pdf;
pub mod router;
pub mod service;

pub use config::Config;
pub use error::PortalError;
