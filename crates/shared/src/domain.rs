use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Opaque string key naming a specific blockchain network, e.g. `osmosis-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Wallet software integrations the workbench can drive. Exactly one is
/// active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletProvider {
    Leap,
    Keplr,
    Cosmostation,
    Station,
}

impl WalletProvider {
    pub const ALL: [WalletProvider; 4] = [
        Self::Leap,
        Self::Keplr,
        Self::Cosmostation,
        Self::Station,
    ];

    /// Human-readable provider name for selectors and session lists.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leap => "Leap",
            Self::Keplr => "Keplr",
            Self::Cosmostation => "Cosmostation",
            Self::Station => "Terra Station",
        }
    }
}

impl fmt::Display for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WalletProvider {
    type Err = WalletError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "leap" => Ok(Self::Leap),
            "keplr" => Ok(Self::Keplr),
            "cosmostation" => Ok(Self::Cosmostation),
            "station" | "terra-station" => Ok(Self::Station),
            other => Err(WalletError::UnknownProvider(other.to_string())),
        }
    }
}

/// How a provider session is established: through an installed extension
/// or through a remote wallet-connect style session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    Extension,
    WalletConnect,
}

impl ConnectionMode {
    pub const ALL: [ConnectionMode; 2] = [Self::Extension, Self::WalletConnect];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Extension => "Extension",
            Self::WalletConnect => "Wallet Connect",
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConnectionMode {
    type Err = WalletError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "extension" => Ok(Self::Extension),
            "walletconnect" | "wallet-connect" | "wc" => Ok(Self::WalletConnect),
            other => Err(WalletError::UnknownConnectionMode(other.to_string())),
        }
    }
}

/// A denominated token amount. Amounts stay as decimal strings end to end
/// to avoid precision loss on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Per-chain gas price in the chain's fee denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub amount: String,
    pub denom: String,
}

impl GasPrice {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            denom: denom.into(),
        }
    }
}
