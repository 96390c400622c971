use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ChainId;

/// Failure taxonomy for wallet actions. Every variant carries enough text
/// to be surfaced to the user verbatim; none of them are retried
/// automatically.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("unknown chain '{0}'")]
    UnknownChain(ChainId),
    #[error("unknown wallet provider '{0}'")]
    UnknownProvider(String),
    #[error("unknown connection mode '{0}'")]
    UnknownConnectionMode(String),
    #[error("wallet not connected for chain '{0}'")]
    NotConnected(ChainId),
    #[error("no controller registered for provider '{0}'")]
    MissingController(String),
    #[error("provider rejected the request: {0}")]
    ProviderRejected(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("session does not support {0}")]
    UnsupportedCapability(&'static str),
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Coarse category used by presentation layers to route an error to the
/// right notice surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletErrorKind {
    UnknownChain,
    NotConnected,
    Provider,
    Network,
    Capability,
    Other,
}

impl WalletError {
    pub fn kind(&self) -> WalletErrorKind {
        match self {
            WalletError::UnknownChain(_) => WalletErrorKind::UnknownChain,
            WalletError::NotConnected(_) => WalletErrorKind::NotConnected,
            WalletError::ProviderRejected(_) | WalletError::MissingController(_) => {
                WalletErrorKind::Provider
            }
            WalletError::Network(_) => WalletErrorKind::Network,
            WalletError::UnsupportedCapability(_) => WalletErrorKind::Capability,
            WalletError::UnknownProvider(_)
            | WalletError::UnknownConnectionMode(_)
            | WalletError::Signing(_) => WalletErrorKind::Other,
        }
    }
}
