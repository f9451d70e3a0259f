pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod service;
pub mod sweep;

pub use adapter::StoreRoleReader;
pub use error::ServiceError;
pub use service::{AuthzService, ServiceConfig};
