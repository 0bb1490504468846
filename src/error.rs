use crate::{bustime::error::BustimeError, config::ConfigError, writer::PublishError};

#[derive(thiserror::Error, Debug)]
pub enum NextBusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] BustimeError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

impl NextBusError {
    /// Which part of a cycle failed, for log context
    pub fn stage(&self) -> &'static str {
        match self {
            NextBusError::Config(_) => "config",
            NextBusError::Fetch(_) => "fetch",
            NextBusError::Publish(_) => "publish",
        }
    }
}

pub type NextBusResult<T> = Result<T, NextBusError>;
