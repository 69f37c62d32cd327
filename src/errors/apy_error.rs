//! Error taxonomy for chain reads, oracle lookups and configuration

use alloy::primitives::Address;
use std::time::Duration;
use thiserror::Error;
use crate::types::OracleNamespace;

#[derive(Error, Debug)]
pub enum ApyError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Timed out after {timeout:?}: {context}")]
    Timeout {
        context: String,
        timeout: Duration,
    },

    #[error("Contract read failed: {contract} - {message}")]
    Contract {
        contract: Address,
        message: String,
    },

    #[error("Price unavailable: {namespace}/{id}")]
    PriceUnavailable {
        namespace: OracleNamespace,
        id: String,
    },

    #[error("Oracle error: {message}")]
    Oracle {
        message: String,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The fetcher's task panicked or was cancelled
    #[error("Fetcher task aborted: {0}")]
    TaskAborted(String),
}

pub type ApyResult<T> = Result<T, ApyError>;

impl ApyError {
    pub fn network(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApyError::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn contract(contract: Address, message: impl Into<String>) -> Self {
        ApyError::Contract {
            contract,
            message: message.into(),
        }
    }

    pub fn parsing(context: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApyError::DataParsing {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Failures of the reader or oracle boundary. These end the fetcher for
    /// the current run; the next scheduled run tries again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApyError::Network { .. }
                | ApyError::Timeout { .. }
                | ApyError::Contract { .. }
                | ApyError::Oracle { .. }
        )
    }
}
