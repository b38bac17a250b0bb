pub mod args;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod inputs;
pub mod tools;
pub mod types;

pub use dispatcher::{Completed, Dispatcher};
pub use error::{DeployError, Result};
