//! Adapter between the hub's session representation and the capability
//! interface the external liquidity widget expects: enable, account
//! lookup, and direct-signer access, with lazy session establishment.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use shared::domain::ChainId;
use shared::error::WalletError;
use shared::tx::KeyAlgo;
use tracing::info;

use crate::{ConnectedSession, DirectSigner, WalletHub};

/// Display configuration handed to the widget host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub icon: String,
    pub title: String,
    pub subtitle: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            icon: "/wallet.svg".to_string(),
            title: "Try out the Liquidity Widget".to_string(),
            subtitle: "Backed by the workbench wallet hub".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetTheme {
    Light,
    Dark,
}

/// Account view the widget consumes: printable address plus decoded
/// public key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetAccount {
    pub address: String,
    pub algo: KeyAlgo,
    pub pub_key: Vec<u8>,
}

/// The capability surface the liquidity widget requires from its host.
#[async_trait]
pub trait WidgetWalletClient: Send + Sync {
    /// Ensures sessions exist for the given chains.
    async fn enable(&self, chains: &[ChainId]) -> Result<(), WalletError>;

    /// Returns account material for the chain, connecting lazily if no
    /// session exists yet.
    async fn account(&self, chain_id: &ChainId) -> Result<WidgetAccount, WalletError>;

    /// Returns the direct signer for the chain, connecting lazily; fails
    /// when the active session does not support direct signing.
    async fn signer(&self, chain_id: &ChainId) -> Result<Arc<dyn DirectSigner>, WalletError>;
}

/// Widget client implementation over the hub.
pub struct HubWidgetClient {
    hub: Arc<WalletHub>,
}

impl HubWidgetClient {
    pub fn new(hub: Arc<WalletHub>) -> Self {
        Self { hub }
    }

    async fn session_or_connect(
        &self,
        chain_id: &ChainId,
    ) -> Result<Arc<dyn ConnectedSession>, WalletError> {
        if let Some(session) = self.hub.session_for(chain_id).await {
            return Ok(session);
        }
        let mode = self.hub.selected_mode().await;
        info!(chain = %chain_id, "widget adapter establishing session lazily");
        self.hub.connect(mode, std::slice::from_ref(chain_id)).await?;
        self.hub
            .session_for(chain_id)
            .await
            .ok_or_else(|| WalletError::NotConnected(chain_id.clone()))
    }
}

#[async_trait]
impl WidgetWalletClient for HubWidgetClient {
    async fn enable(&self, chains: &[ChainId]) -> Result<(), WalletError> {
        if chains.is_empty() {
            return Ok(());
        }
        let mode = self.hub.selected_mode().await;
        self.hub.connect(mode, chains).await.map(|_| ())
    }

    async fn account(&self, chain_id: &ChainId) -> Result<WidgetAccount, WalletError> {
        let session = self.session_or_connect(chain_id).await?;
        let key = session.account_key();
        let pub_key = STANDARD.decode(&key.pub_key_b64).map_err(|err| {
            WalletError::ProviderRejected(format!("session returned invalid public key: {err}"))
        })?;
        Ok(WidgetAccount {
            address: key.address,
            algo: key.algo,
            pub_key,
        })
    }

    async fn signer(&self, chain_id: &ChainId) -> Result<Arc<dyn DirectSigner>, WalletError> {
        let session = self.session_or_connect(chain_id).await?;
        session
            .direct_signer()
            .ok_or(WalletError::UnsupportedCapability("direct signing"))
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
