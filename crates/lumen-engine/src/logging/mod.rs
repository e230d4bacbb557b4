//! Logging utilities.
//!
//! Centralizes logger initialization. Engine code only talks to the `log`
//! facade; `env_logger` is installed here for the binaries.

mod init;

pub use init::{LoggingConfig, init_logging};
