//! Wallet coordination core: controller and session capability traits,
//! the connection state store, the user-facing action handlers, and the
//! controller event reconciliation loop.
//!
//! The wallet protocol itself (connection handshakes, key custody, fee
//! estimation, broadcast) lives behind [`WalletController`] and
//! [`ConnectedSession`]; this crate only coordinates sessions and state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::domain::{ChainId, Coin, ConnectionMode, GasPrice, WalletProvider};
use shared::error::WalletError;
use shared::registry::ChainRegistry;
use shared::tx::{AccountKey, ArbitrarySignature, Fee, TransferMsg, TxResponse, UnsignedTx};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

pub mod adapter;
pub mod softkey;

/// Fixed literal signed by the Sign-Arbitrary action.
pub const SIGN_ARBITRARY_MSG: &str =
    "Wallet Workbench signature check: this message only proves the connected wallet can sign.";

/// Memo attached to the demo self-transfer.
pub const TX_MEMO: &str = "signed via cosmes";

/// Self-transfer amount, in base units of the chain's fee denom.
const SELF_TRANSFER_AMOUNT: &str = "1";

/// Connection parameters for one chain, resolved from the registry before
/// a controller is asked to establish a session.
#[derive(Debug, Clone)]
pub struct ChainAccess {
    pub chain_id: ChainId,
    pub rpc: String,
    pub gas_price: GasPrice,
    pub address_prefix: String,
}

/// Asynchronous notifications a controller emits about sessions it tore
/// down or rebound on its own (e.g. the wallet software switched accounts).
#[derive(Debug, Clone)]
pub enum ControllerNotice {
    Disconnected {
        chains: Vec<ChainId>,
    },
    AccountChanged {
        mode: ConnectionMode,
        chains: Vec<ChainId>,
    },
}

/// Capability interface of one wallet provider integration.
#[async_trait]
pub trait WalletController: Send + Sync {
    fn id(&self) -> WalletProvider;

    /// Establishes sessions for the given chains in the given mode.
    /// Either all requested chains connect or the call fails as a whole.
    async fn connect(
        &self,
        mode: ConnectionMode,
        chains: &[ChainAccess],
    ) -> Result<Vec<(ChainId, Arc<dyn ConnectedSession>)>, WalletError>;

    /// Tears down the sessions for the given chains. Confirmation arrives
    /// asynchronously as a [`ControllerNotice::Disconnected`].
    async fn disconnect(&self, chains: &[ChainId]) -> Result<(), WalletError>;

    fn subscribe(&self) -> broadcast::Receiver<ControllerNotice>;
}

/// Capability interface of one established (provider, chain) session.
#[async_trait]
pub trait ConnectedSession: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> WalletProvider;
    fn mode(&self) -> ConnectionMode;
    fn chain_id(&self) -> &ChainId;
    fn address(&self) -> &str;
    fn account_key(&self) -> AccountKey;

    async fn sign_arbitrary(&self, message: &str) -> Result<ArbitrarySignature, WalletError>;
    async fn estimate_fee(&self, tx: &UnsignedTx) -> Result<Fee, WalletError>;
    async fn broadcast(&self, tx: &UnsignedTx, fee: &Fee) -> Result<TxResponse, WalletError>;

    /// Extension-backed sessions expose a direct signer; remote sessions
    /// return `None`.
    fn direct_signer(&self) -> Option<Arc<dyn DirectSigner>>;
}

/// Direct document signing, the capability the liquidity widget requires
/// from extension-backed sessions.
#[async_trait]
pub trait DirectSigner: Send + Sync + std::fmt::Debug {
    fn account(&self) -> AccountKey;
    async fn sign_direct(&self, sign_doc: &[u8]) -> Result<ArbitrarySignature, WalletError>;
}

/// Null controller used where a provider integration is not wired.
pub struct MissingWalletController {
    provider: WalletProvider,
    notices: broadcast::Sender<ControllerNotice>,
}

impl MissingWalletController {
    pub fn new(provider: WalletProvider) -> Self {
        let (notices, _) = broadcast::channel(1);
        Self { provider, notices }
    }
}

#[async_trait]
impl WalletController for MissingWalletController {
    fn id(&self) -> WalletProvider {
        self.provider
    }

    async fn connect(
        &self,
        _mode: ConnectionMode,
        _chains: &[ChainAccess],
    ) -> Result<Vec<(ChainId, Arc<dyn ConnectedSession>)>, WalletError> {
        Err(WalletError::MissingController(
            self.provider.label().to_string(),
        ))
    }

    async fn disconnect(&self, _chains: &[ChainId]) -> Result<(), WalletError> {
        Err(WalletError::MissingController(
            self.provider.label().to_string(),
        ))
    }

    fn subscribe(&self) -> broadcast::Receiver<ControllerNotice> {
        self.notices.subscribe()
    }
}

/// Rendering snapshot of one stored session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub chain_id: ChainId,
    pub provider: WalletProvider,
    pub mode: ConnectionMode,
    pub address: String,
    pub connected_at: DateTime<Utc>,
}

/// Events the hub emits so presentation layers re-render.
#[derive(Debug, Clone)]
pub enum HubEvent {
    SessionsChanged(Vec<SessionSummary>),
}

struct StoredSession {
    session: Arc<dyn ConnectedSession>,
    connected_at: DateTime<Utc>,
}

/// At most one session per chain; insertion overwrites any prior entry for
/// that chain. Mutated only on the hub's runtime, so the last completed
/// connect for a chain wins.
#[derive(Default)]
struct ConnectionStore {
    sessions: HashMap<ChainId, StoredSession>,
}

impl ConnectionStore {
    fn merge(&mut self, entries: Vec<(ChainId, Arc<dyn ConnectedSession>)>) -> usize {
        let merged = entries.len();
        let connected_at = Utc::now();
        for (chain_id, session) in entries {
            self.sessions.insert(
                chain_id,
                StoredSession {
                    session,
                    connected_at,
                },
            );
        }
        merged
    }

    fn remove(&mut self, chains: &[ChainId]) -> usize {
        chains
            .iter()
            .filter(|chain_id| self.sessions.remove(chain_id).is_some())
            .count()
    }

    fn session_for(&self, chain_id: &ChainId) -> Option<Arc<dyn ConnectedSession>> {
        self.sessions
            .get(chain_id)
            .map(|stored| Arc::clone(&stored.session))
    }

    fn snapshot(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|(chain_id, stored)| SessionSummary {
                chain_id: chain_id.clone(),
                provider: stored.session.provider(),
                mode: stored.session.mode(),
                address: stored.session.address().to_string(),
                connected_at: stored.connected_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.chain_id.as_str().cmp(b.chain_id.as_str()));
        summaries
    }
}

struct HubState {
    selected_chain: ChainId,
    selected_provider: WalletProvider,
    selected_mode: ConnectionMode,
    store: ConnectionStore,
}

/// Owns the connection state store, the controller registry, and the
/// action handlers. All mutation happens through `&self` methods awaited
/// on a single backend runtime.
pub struct WalletHub {
    registry: Arc<ChainRegistry>,
    controllers: HashMap<WalletProvider, Arc<dyn WalletController>>,
    inner: Mutex<HubState>,
    events: broadcast::Sender<HubEvent>,
}

impl WalletHub {
    pub fn new(
        registry: Arc<ChainRegistry>,
        controllers: Vec<Arc<dyn WalletController>>,
    ) -> Arc<Self> {
        let selected_chain = registry
            .chain_ids()
            .next()
            .cloned()
            .unwrap_or_else(|| ChainId::from("osmosis-1"));
        let controllers = controllers
            .into_iter()
            .map(|controller| (controller.id(), controller))
            .collect();
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            registry,
            controllers,
            inner: Mutex::new(HubState {
                selected_chain,
                selected_provider: WalletProvider::Leap,
                selected_mode: ConnectionMode::Extension,
                store: ConnectionStore::default(),
            }),
            events,
        })
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    /// Subscribes to every controller once for the lifetime of the
    /// process. Notices from one controller are processed in delivery
    /// order; notices from different controllers interleave freely.
    pub fn start_event_reconciliation(self: &Arc<Self>) {
        for controller in self.controllers.values() {
            let provider = controller.id();
            let mut notices = controller.subscribe();
            let hub = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    match notices.recv().await {
                        Ok(notice) => hub.handle_controller_notice(provider, notice).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(provider = %provider, skipped, "controller notices lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    pub async fn select_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
        self.registry.entry(&chain_id)?;
        self.inner.lock().await.selected_chain = chain_id;
        Ok(())
    }

    pub async fn select_provider(&self, provider: WalletProvider) {
        self.inner.lock().await.selected_provider = provider;
    }

    pub async fn select_mode(&self, mode: ConnectionMode) {
        self.inner.lock().await.selected_mode = mode;
    }

    pub async fn selected_chain(&self) -> ChainId {
        self.inner.lock().await.selected_chain.clone()
    }

    pub async fn selected_provider(&self) -> WalletProvider {
        self.inner.lock().await.selected_provider
    }

    pub async fn selected_mode(&self) -> ConnectionMode {
        self.inner.lock().await.selected_mode
    }

    pub async fn session_for(&self, chain_id: &ChainId) -> Option<Arc<dyn ConnectedSession>> {
        self.inner.lock().await.store.session_for(chain_id)
    }

    pub async fn sessions_snapshot(&self) -> Vec<SessionSummary> {
        self.inner.lock().await.store.snapshot()
    }

    /// Connect Action: resolves every chain through the registry (an
    /// unknown chain fails the whole call before anything is written),
    /// asks the selected provider's controller for sessions, and merges
    /// the result into the store.
    pub async fn connect(
        &self,
        mode: ConnectionMode,
        chains: &[ChainId],
    ) -> Result<Vec<SessionSummary>, WalletError> {
        let provider = self.selected_provider().await;
        self.connect_for(provider, mode, chains).await
    }

    async fn connect_for(
        &self,
        provider: WalletProvider,
        mode: ConnectionMode,
        chains: &[ChainId],
    ) -> Result<Vec<SessionSummary>, WalletError> {
        let controller = self.controller(provider)?;

        let mut access = Vec::with_capacity(chains.len());
        for chain_id in chains {
            let entry = self.registry.entry(chain_id)?;
            access.push(ChainAccess {
                chain_id: chain_id.clone(),
                rpc: entry.rpc.to_string(),
                gas_price: entry.gas_price(),
                address_prefix: entry.address_prefix.to_string(),
            });
        }

        let sessions = controller.connect(mode, &access).await?;
        info!(
            provider = %provider,
            mode = %mode,
            connected = sessions.len(),
            "wallet connect succeeded"
        );

        let snapshot = {
            let mut guard = self.inner.lock().await;
            guard.store.merge(sessions);
            guard.store.snapshot()
        };
        let _ = self
            .events
            .send(HubEvent::SessionsChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Disconnect Action: asks the selected provider to tear down the
    /// session for the selected chain. The store entry is NOT removed
    /// here; removal arrives through the controller's disconnect notice.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let (provider, chain_id) = {
            let guard = self.inner.lock().await;
            (guard.selected_provider, guard.selected_chain.clone())
        };
        let controller = self.controller(provider)?;
        info!(provider = %provider, chain = %chain_id, "wallet disconnect requested");
        controller.disconnect(std::slice::from_ref(&chain_id)).await
    }

    /// Sign-Arbitrary Action: requires a session for the selected chain.
    pub async fn sign_arbitrary(&self) -> Result<ArbitrarySignature, WalletError> {
        let (chain_id, session) = self.active_session().await?;
        let signature = session.sign_arbitrary(SIGN_ARBITRARY_MSG).await?;
        info!(chain = %chain_id, "arbitrary message signed");
        Ok(signature)
    }

    /// Broadcast-Transfer Action: builds a one-unit self-transfer in the
    /// chain's fee denom, estimates a fee, then signs and broadcasts with
    /// that fee. Any stage failing aborts the action.
    pub async fn broadcast_transfer(&self) -> Result<TxResponse, WalletError> {
        let (chain_id, session) = self.active_session().await?;
        let fee_denom = self.registry.fee_denom(&chain_id)?;

        let address = session.address().to_string();
        let tx = UnsignedTx {
            msgs: vec![TransferMsg {
                from_address: address.clone(),
                to_address: address,
                amount: vec![Coin::new(fee_denom, SELF_TRANSFER_AMOUNT)],
            }],
            memo: TX_MEMO.to_string(),
        };

        let fee = session.estimate_fee(&tx).await?;
        info!(chain = %chain_id, gas = %fee.gas, "fee estimated for self-transfer");

        let response = session.broadcast(&tx, &fee).await?;
        info!(chain = %chain_id, txhash = %response.txhash, "transfer broadcast");
        Ok(response)
    }

    /// Applies one controller notice to the store. Disconnects drop the
    /// named chains; account changes re-run the Connect Action for the
    /// controller that fired, refreshing the affected sessions.
    pub(crate) async fn handle_controller_notice(
        &self,
        provider: WalletProvider,
        notice: ControllerNotice,
    ) {
        match notice {
            ControllerNotice::Disconnected { chains } => {
                info!(provider = %provider, chains = ?chains, "controller reported disconnect");
                let snapshot = {
                    let mut guard = self.inner.lock().await;
                    let removed = guard.store.remove(&chains);
                    if removed == 0 {
                        return;
                    }
                    guard.store.snapshot()
                };
                let _ = self.events.send(HubEvent::SessionsChanged(snapshot));
            }
            ControllerNotice::AccountChanged { mode, chains } => {
                info!(provider = %provider, chains = ?chains, "controller reported account change");
                if let Err(err) = self.connect_for(provider, mode, &chains).await {
                    error!(provider = %provider, "account-change reconnect failed: {err}");
                }
            }
        }
    }

    async fn active_session(
        &self,
    ) -> Result<(ChainId, Arc<dyn ConnectedSession>), WalletError> {
        let guard = self.inner.lock().await;
        let chain_id = guard.selected_chain.clone();
        match guard.store.session_for(&chain_id) {
            Some(session) => Ok((chain_id, session)),
            None => Err(WalletError::NotConnected(chain_id)),
        }
    }

    fn controller(
        &self,
        provider: WalletProvider,
    ) -> Result<&Arc<dyn WalletController>, WalletError> {
        self.controllers
            .get(&provider)
            .ok_or_else(|| WalletError::MissingController(provider.label().to_string()))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
