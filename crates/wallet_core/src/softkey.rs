//! In-process software-key wallet backend. Implements the controller and
//! session capability traits with deterministic secp256k1 accounts so the
//! apps and tests have a working provider to wire; it stands in for the
//! external wallet software, including firing the disconnect and
//! account-change notices that software would emit on its own.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bech32::{ToBase32, Variant};
use k256::ecdsa::{signature::Signer, Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use shared::domain::{ChainId, ConnectionMode, GasPrice, WalletProvider};
use shared::error::WalletError;
use shared::tx::{AccountKey, ArbitrarySignature, Fee, KeyAlgo, TxResponse, UnsignedTx};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use crate::{ChainAccess, ConnectedSession, ControllerNotice, DirectSigner, WalletController};

/// Throwaway development mnemonic (the BIP-39 reference vector). All
/// accounts derived from it are public knowledge; never fund them.
pub const DEV_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

const GAS_LIMIT: u64 = 200_000;

struct SoftKeyAccounts {
    connected: HashMap<ChainId, ConnectionMode>,
    account_index: HashMap<ChainId, u32>,
}

/// Software-key implementation of [`WalletController`].
pub struct SoftKeyController {
    provider: WalletProvider,
    seed: [u8; 64],
    notices: broadcast::Sender<ControllerNotice>,
    accounts: Mutex<SoftKeyAccounts>,
}

impl SoftKeyController {
    pub fn new(provider: WalletProvider, mnemonic: &str) -> Result<Self, WalletError> {
        let mnemonic = bip39::Mnemonic::parse_normalized(mnemonic)
            .map_err(|err| WalletError::ProviderRejected(format!("invalid mnemonic: {err}")))?;
        let (notices, _) = broadcast::channel(64);
        Ok(Self {
            provider,
            seed: mnemonic.to_seed(""),
            notices,
            accounts: Mutex::new(SoftKeyAccounts {
                connected: HashMap::new(),
                account_index: HashMap::new(),
            }),
        })
    }

    pub fn dev(provider: WalletProvider) -> Result<Self, WalletError> {
        Self::new(provider, DEV_MNEMONIC)
    }

    /// Builds one controller per supported provider, all on the same
    /// development seed.
    pub fn dev_set() -> Result<Vec<Arc<dyn WalletController>>, WalletError> {
        WalletProvider::ALL
            .iter()
            .map(|provider| {
                Ok(Arc::new(Self::dev(*provider)?) as Arc<dyn WalletController>)
            })
            .collect()
    }

    /// Tears sessions down the way the external wallet software would:
    /// drops them and fires the disconnect notice.
    pub async fn simulate_external_disconnect(&self, chains: &[ChainId]) {
        let torn = {
            let mut accounts = self.accounts.lock().await;
            chains
                .iter()
                .filter(|chain_id| accounts.connected.remove(*chain_id).is_some())
                .cloned()
                .collect::<Vec<_>>()
        };
        if torn.is_empty() {
            return;
        }
        info!(provider = %self.provider, chains = ?torn, "softkey external disconnect");
        let _ = self
            .notices
            .send(ControllerNotice::Disconnected { chains: torn });
    }

    /// Rotates the account behind each connected chain and fires the
    /// account-change notice, as the wallet software does when the user
    /// switches accounts.
    pub async fn simulate_account_change(&self, chains: &[ChainId]) {
        let affected = {
            let mut accounts = self.accounts.lock().await;
            let mut affected = Vec::new();
            for chain_id in chains {
                if let Some(mode) = accounts.connected.get(chain_id).copied() {
                    *accounts.account_index.entry(chain_id.clone()).or_insert(0) += 1;
                    affected.push((chain_id.clone(), mode));
                }
            }
            affected
        };
        let Some(&(_, mode)) = affected.first() else {
            return;
        };
        let chains: Vec<ChainId> = affected.into_iter().map(|(chain_id, _)| chain_id).collect();
        info!(provider = %self.provider, chains = ?chains, "softkey account change");
        let _ = self
            .notices
            .send(ControllerNotice::AccountChanged { mode, chains });
    }

    fn derive_session(
        &self,
        access: &ChainAccess,
        mode: ConnectionMode,
        account_index: u32,
    ) -> Result<SoftKeySession, WalletError> {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(self.provider.label().as_bytes());
        hasher.update(access.chain_id.as_str().as_bytes());
        hasher.update(account_index.to_be_bytes());
        let key_bytes = hasher.finalize();

        let signing_key = SigningKey::from_slice(key_bytes.as_slice())
            .map_err(|err| WalletError::Signing(format!("key derivation failed: {err}")))?;
        let pub_key = signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let address = bech32_address(&access.address_prefix, &pub_key)?;

        Ok(SoftKeySession {
            provider: self.provider,
            mode,
            chain_id: access.chain_id.clone(),
            gas_price: access.gas_price.clone(),
            address,
            pub_key,
            signing_key,
        })
    }
}

#[async_trait]
impl WalletController for SoftKeyController {
    fn id(&self) -> WalletProvider {
        self.provider
    }

    async fn connect(
        &self,
        mode: ConnectionMode,
        chains: &[ChainAccess],
    ) -> Result<Vec<(ChainId, Arc<dyn ConnectedSession>)>, WalletError> {
        let mut accounts = self.accounts.lock().await;
        let mut sessions = Vec::with_capacity(chains.len());
        for access in chains {
            let account_index = accounts
                .account_index
                .get(&access.chain_id)
                .copied()
                .unwrap_or(0);
            let session = self.derive_session(access, mode, account_index)?;
            accounts.connected.insert(access.chain_id.clone(), mode);
            sessions.push((
                access.chain_id.clone(),
                Arc::new(session) as Arc<dyn ConnectedSession>,
            ));
        }
        info!(
            provider = %self.provider,
            mode = %mode,
            connected = sessions.len(),
            "softkey connect"
        );
        Ok(sessions)
    }

    async fn disconnect(&self, chains: &[ChainId]) -> Result<(), WalletError> {
        self.simulate_external_disconnect(chains).await;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ControllerNotice> {
        self.notices.subscribe()
    }
}

#[derive(Debug)]
struct SoftKeySession {
    provider: WalletProvider,
    mode: ConnectionMode,
    chain_id: ChainId,
    gas_price: GasPrice,
    address: String,
    pub_key: Vec<u8>,
    signing_key: SigningKey,
}

impl SoftKeySession {
    fn sign_bytes(&self, payload: &[u8]) -> ArbitrarySignature {
        let signature: Signature = self.signing_key.sign(payload);
        ArbitrarySignature {
            algo: KeyAlgo::Secp256k1,
            pub_key_b64: STANDARD.encode(&self.pub_key),
            signature_b64: STANDARD.encode(signature.to_bytes()),
        }
    }

    fn check_sender(&self, tx: &UnsignedTx) -> Result<(), WalletError> {
        if tx.msgs.is_empty() {
            return Err(WalletError::ProviderRejected(
                "transaction has no messages".to_string(),
            ));
        }
        for msg in &tx.msgs {
            if msg.from_address != self.address {
                return Err(WalletError::ProviderRejected(format!(
                    "sender {} does not belong to this session",
                    msg.from_address
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectedSession for SoftKeySession {
    fn provider(&self) -> WalletProvider {
        self.provider
    }

    fn mode(&self) -> ConnectionMode {
        self.mode
    }

    fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn account_key(&self) -> AccountKey {
        AccountKey {
            address: self.address.clone(),
            algo: KeyAlgo::Secp256k1,
            pub_key_b64: STANDARD.encode(&self.pub_key),
        }
    }

    async fn sign_arbitrary(&self, message: &str) -> Result<ArbitrarySignature, WalletError> {
        Ok(self.sign_bytes(message.as_bytes()))
    }

    async fn estimate_fee(&self, tx: &UnsignedTx) -> Result<Fee, WalletError> {
        self.check_sender(tx)?;
        let per_gas: f64 = self.gas_price.amount.parse().map_err(|_| {
            WalletError::ProviderRejected(format!(
                "cannot quote fee: malformed gas price '{}{}'",
                self.gas_price.amount, self.gas_price.denom
            ))
        })?;
        let amount = (per_gas * GAS_LIMIT as f64).ceil() as u128;
        Ok(Fee {
            amount: vec![shared::domain::Coin::new(
                self.gas_price.denom.clone(),
                amount.to_string(),
            )],
            gas: GAS_LIMIT.to_string(),
        })
    }

    async fn broadcast(&self, tx: &UnsignedTx, fee: &Fee) -> Result<TxResponse, WalletError> {
        self.check_sender(tx)?;
        let signed = serde_json::json!({
            "chain_id": self.chain_id,
            "signer": self.address,
            "tx": tx,
            "fee": fee,
        });
        let payload = serde_json::to_vec(&signed)
            .map_err(|err| WalletError::Signing(format!("cannot encode transaction: {err}")))?;
        let signature = self.sign_bytes(&payload);
        let mut hasher = Sha256::new();
        hasher.update(&payload);
        hasher.update(signature.signature_b64.as_bytes());
        let txhash = hex::encode_upper(hasher.finalize());
        info!(chain = %self.chain_id, txhash = %txhash, "softkey broadcast acknowledged");
        Ok(TxResponse {
            txhash,
            code: 0,
            raw_log: None,
        })
    }

    fn direct_signer(&self) -> Option<Arc<dyn DirectSigner>> {
        match self.mode {
            ConnectionMode::Extension => Some(Arc::new(SoftKeyDirectSigner {
                account: self.account_key(),
                pub_key: self.pub_key.clone(),
                signing_key: self.signing_key.clone(),
            })),
            ConnectionMode::WalletConnect => None,
        }
    }
}

#[derive(Debug)]
struct SoftKeyDirectSigner {
    account: AccountKey,
    pub_key: Vec<u8>,
    signing_key: SigningKey,
}

#[async_trait]
impl DirectSigner for SoftKeyDirectSigner {
    fn account(&self) -> AccountKey {
        self.account.clone()
    }

    async fn sign_direct(&self, sign_doc: &[u8]) -> Result<ArbitrarySignature, WalletError> {
        let signature: Signature = self.signing_key.sign(sign_doc);
        Ok(ArbitrarySignature {
            algo: KeyAlgo::Secp256k1,
            pub_key_b64: STANDARD.encode(&self.pub_key),
            signature_b64: STANDARD.encode(signature.to_bytes()),
        })
    }
}

fn bech32_address(prefix: &str, pub_key: &[u8]) -> Result<String, WalletError> {
    let sha = Sha256::digest(pub_key);
    let hash = Ripemd160::digest(sha);
    bech32::encode(prefix, hash.as_slice().to_base32(), Variant::Bech32)
        .map_err(|err| WalletError::Signing(format!("address encoding failed: {err}")))
}

#[cfg(test)]
#[path = "tests/softkey_tests.rs"]
mod tests;
