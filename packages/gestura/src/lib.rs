//! Runtime around `gesture-core`: landmark frames in, shell commands out.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod logging;
pub mod source;

pub use app::{App, RunSummary};
pub use config::{Cli, Config};
pub use error::RuntimeError;
