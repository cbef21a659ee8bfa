//! Unified error type.

use crate::config::ConfigError;
use crate::page::TemplateError;

/// The error type returned by veil's fallible startup and serving operations.
///
/// Request-level failures (bad referrer, bad token, ...) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// the failures that stop the process: bad configuration, an unreadable page
/// template, or a socket that cannot be bound.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("template: {0}")]
    Template(#[from] TemplateError),
}
