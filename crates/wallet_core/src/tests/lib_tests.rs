use super::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::tx::KeyAlgo;
use std::time::Duration;

#[derive(Debug)]
struct TestSession {
    provider: WalletProvider,
    mode: ConnectionMode,
    chain_id: ChainId,
    address: String,
    signed: Arc<Mutex<Vec<String>>>,
    estimated: Arc<Mutex<Vec<UnsignedTx>>>,
    broadcasted: Arc<Mutex<Vec<(UnsignedTx, Fee)>>>,
}

#[async_trait]
impl ConnectedSession for TestSession {
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
            pub_key_b64: STANDARD.encode([7u8; 33]),
        }
    }

    async fn sign_arbitrary(&self, message: &str) -> Result<ArbitrarySignature, WalletError> {
        self.signed.lock().await.push(message.to_string());
        Ok(ArbitrarySignature {
            algo: KeyAlgo::Secp256k1,
            pub_key_b64: STANDARD.encode([7u8; 33]),
            signature_b64: STANDARD.encode(b"test-signature"),
        })
    }

    async fn estimate_fee(&self, tx: &UnsignedTx) -> Result<Fee, WalletError> {
        self.estimated.lock().await.push(tx.clone());
        let denom = tx.msgs[0].amount[0].denom.clone();
        Ok(Fee {
            amount: vec![Coin::new(denom, "500")],
            gas: "200000".to_string(),
        })
    }

    async fn broadcast(&self, tx: &UnsignedTx, fee: &Fee) -> Result<TxResponse, WalletError> {
        self.broadcasted
            .lock()
            .await
            .push((tx.clone(), fee.clone()));
        Ok(TxResponse {
            txhash: "CAFEBABE".to_string(),
            code: 0,
            raw_log: None,
        })
    }

    fn direct_signer(&self) -> Option<Arc<dyn DirectSigner>> {
        None
    }
}

struct TestWalletController {
    provider: WalletProvider,
    fail_with: Option<String>,
    notices: broadcast::Sender<ControllerNotice>,
    connect_calls: Arc<Mutex<Vec<(ConnectionMode, Vec<ChainAccess>)>>>,
    disconnect_calls: Arc<Mutex<Vec<Vec<ChainId>>>>,
    address_tag: Arc<Mutex<u32>>,
    signed: Arc<Mutex<Vec<String>>>,
    estimated: Arc<Mutex<Vec<UnsignedTx>>>,
    broadcasted: Arc<Mutex<Vec<(UnsignedTx, Fee)>>>,
}

impl TestWalletController {
    fn ok(provider: WalletProvider) -> Self {
        let (notices, _) = broadcast::channel(16);
        Self {
            provider,
            fail_with: None,
            notices,
            connect_calls: Arc::new(Mutex::new(Vec::new())),
            disconnect_calls: Arc::new(Mutex::new(Vec::new())),
            address_tag: Arc::new(Mutex::new(0)),
            signed: Arc::new(Mutex::new(Vec::new())),
            estimated: Arc::new(Mutex::new(Vec::new())),
            broadcasted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(provider: WalletProvider, err: impl Into<String>) -> Self {
        let mut controller = Self::ok(provider);
        controller.fail_with = Some(err.into());
        controller
    }

    async fn bump_address_tag(&self) {
        *self.address_tag.lock().await += 1;
    }
}

#[async_trait]
impl WalletController for TestWalletController {
    fn id(&self) -> WalletProvider {
        self.provider
    }

    async fn connect(
        &self,
        mode: ConnectionMode,
        chains: &[ChainAccess],
    ) -> Result<Vec<(ChainId, Arc<dyn ConnectedSession>)>, WalletError> {
        if let Some(err) = &self.fail_with {
            return Err(WalletError::ProviderRejected(err.clone()));
        }
        self.connect_calls
            .lock()
            .await
            .push((mode, chains.to_vec()));
        let tag = *self.address_tag.lock().await;
        Ok(chains
            .iter()
            .map(|access| {
                let session = TestSession {
                    provider: self.provider,
                    mode,
                    chain_id: access.chain_id.clone(),
                    address: format!("{}1testaccount{tag}", access.address_prefix),
                    signed: Arc::clone(&self.signed),
                    estimated: Arc::clone(&self.estimated),
                    broadcasted: Arc::clone(&self.broadcasted),
                };
                (
                    access.chain_id.clone(),
                    Arc::new(session) as Arc<dyn ConnectedSession>,
                )
            })
            .collect())
    }

    async fn disconnect(&self, chains: &[ChainId]) -> Result<(), WalletError> {
        if let Some(err) = &self.fail_with {
            return Err(WalletError::ProviderRejected(err.clone()));
        }
        // Teardown acknowledgement arrives via the notice channel, which
        // this double leaves to the test to fire.
        self.disconnect_calls.lock().await.push(chains.to_vec());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ControllerNotice> {
        self.notices.subscribe()
    }
}

fn osmosis() -> ChainId {
    ChainId::from("osmosis-1")
}

fn hub_with(controller: Arc<TestWalletController>) -> Arc<WalletHub> {
    WalletHub::new(
        Arc::new(ChainRegistry::with_default_chains()),
        vec![controller as Arc<dyn WalletController>],
    )
}

#[tokio::test]
async fn connect_stores_exactly_one_session_per_chain() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    let snapshot = hub
        .connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].chain_id, osmosis());
    assert!(snapshot[0].address.starts_with("osmo1"));

    let session = hub.session_for(&osmosis()).await.expect("stored session");
    assert_eq!(session.address(), snapshot[0].address);

    let calls = controller.connect_calls.lock().await;
    assert_eq!(calls.len(), 1);
    let (mode, access) = &calls[0];
    assert_eq!(*mode, ConnectionMode::Extension);
    assert_eq!(access[0].rpc, "https://rpc.osmosis.zone");
    assert_eq!(access[0].gas_price.amount, "0.0025");
    assert_eq!(access[0].gas_price.denom, "uosmo");
}

#[tokio::test]
async fn connect_unknown_chain_fails_before_reaching_the_controller() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    let err = hub
        .connect(
            ConnectionMode::Extension,
            &[osmosis(), ChainId::from("atlantis-9")],
        )
        .await
        .expect_err("unknown chain");

    assert!(matches!(err, WalletError::UnknownChain(_)));
    assert!(hub.sessions_snapshot().await.is_empty());
    assert!(controller.connect_calls.lock().await.is_empty());
}

#[tokio::test]
async fn connect_failure_leaves_prior_state_untouched() {
    let controller = Arc::new(TestWalletController::failing(
        WalletProvider::Leap,
        "user rejected the request",
    ));
    let hub = hub_with(controller);

    let err = hub
        .connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect_err("rejected");

    assert!(matches!(err, WalletError::ProviderRejected(_)));
    assert!(hub.sessions_snapshot().await.is_empty());
}

#[tokio::test]
async fn disconnect_defers_store_removal_to_the_controller_notice() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");
    hub.disconnect().await.expect("disconnect");

    // The controller was asked to tear down, but without the notice the
    // stale session stays in the store.
    assert_eq!(controller.disconnect_calls.lock().await.len(), 1);
    assert!(hub.session_for(&osmosis()).await.is_some());

    hub.handle_controller_notice(
        WalletProvider::Leap,
        ControllerNotice::Disconnected {
            chains: vec![osmosis()],
        },
    )
    .await;
    assert!(hub.session_for(&osmosis()).await.is_none());
}

#[tokio::test]
async fn reconciliation_task_removes_sessions_on_disconnect_notice() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));
    hub.start_event_reconciliation();

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");

    controller
        .notices
        .send(ControllerNotice::Disconnected {
            chains: vec![osmosis()],
        })
        .expect("subscribed");

    let mut removed = false;
    for _ in 0..100 {
        if hub.session_for(&osmosis()).await.is_none() {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(removed, "disconnect notice never drained the store");
}

#[tokio::test]
async fn account_change_notice_replaces_the_session_with_a_fresh_one() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");
    let before = hub
        .session_for(&osmosis())
        .await
        .expect("session")
        .address()
        .to_string();

    controller.bump_address_tag().await;
    hub.handle_controller_notice(
        WalletProvider::Leap,
        ControllerNotice::AccountChanged {
            mode: ConnectionMode::Extension,
            chains: vec![osmosis()],
        },
    )
    .await;

    let after = hub
        .session_for(&osmosis())
        .await
        .expect("refreshed session")
        .address()
        .to_string();
    assert_ne!(before, after);
    assert_eq!(controller.connect_calls.lock().await.len(), 2);
}

#[tokio::test]
async fn sign_and_broadcast_abort_without_a_session_and_do_not_mutate_the_store() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(controller);

    let err = hub.sign_arbitrary().await.expect_err("not connected");
    assert!(matches!(err, WalletError::NotConnected(_)));

    let err = hub.broadcast_transfer().await.expect_err("not connected");
    assert!(matches!(err, WalletError::NotConnected(_)));

    assert!(hub.sessions_snapshot().await.is_empty());
}

#[tokio::test]
async fn broadcast_builds_a_one_unit_self_transfer_with_the_fixed_memo() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");
    let address = hub
        .session_for(&osmosis())
        .await
        .expect("session")
        .address()
        .to_string();

    let response = hub.broadcast_transfer().await.expect("broadcast");
    assert_eq!(response.txhash, "CAFEBABE");
    assert!(response.accepted());

    let estimated = controller.estimated.lock().await;
    assert_eq!(estimated.len(), 1);
    let tx = &estimated[0];
    assert_eq!(tx.memo, TX_MEMO);
    assert_eq!(tx.msgs.len(), 1);
    assert_eq!(tx.msgs[0].from_address, address);
    assert_eq!(tx.msgs[0].to_address, address);
    assert_eq!(tx.msgs[0].amount, vec![Coin::new("uosmo", "1")]);

    let broadcasted = controller.broadcasted.lock().await;
    assert_eq!(broadcasted.len(), 1);
    let (_, fee) = &broadcasted[0];
    assert_eq!(fee.amount, vec![Coin::new("uosmo", "500")]);
}

#[tokio::test]
async fn sign_arbitrary_signs_the_fixed_literal() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");
    hub.sign_arbitrary().await.expect("sign");

    let signed = controller.signed.lock().await;
    assert_eq!(signed.as_slice(), [SIGN_ARBITRARY_MSG.to_string()]);
}

#[tokio::test]
async fn repeated_connect_overwrites_the_stored_session() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(Arc::clone(&controller));

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("first connect");
    controller.bump_address_tag().await;
    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("second connect");

    let snapshot = hub.sessions_snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].address.ends_with('1'));
}

#[tokio::test]
async fn store_changes_emit_hub_events() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(controller);
    let mut events = hub.subscribe_events();

    hub.connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect("connect");
    let HubEvent::SessionsChanged(snapshot) = events.try_recv().expect("merge event");
    assert_eq!(snapshot.len(), 1);

    hub.handle_controller_notice(
        WalletProvider::Leap,
        ControllerNotice::Disconnected {
            chains: vec![osmosis()],
        },
    )
    .await;
    let HubEvent::SessionsChanged(snapshot) = events.try_recv().expect("remove event");
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn selecting_an_unknown_chain_is_rejected() {
    let controller = Arc::new(TestWalletController::ok(WalletProvider::Leap));
    let hub = hub_with(controller);

    let err = hub
        .select_chain(ChainId::from("atlantis-9"))
        .await
        .expect_err("unknown chain");
    assert!(matches!(err, WalletError::UnknownChain(_)));
    assert_eq!(hub.selected_chain().await, osmosis());
}

#[tokio::test]
async fn missing_wallet_controller_rejects_every_call() {
    let controller = MissingWalletController::new(WalletProvider::Station);

    let err = controller
        .connect(ConnectionMode::Extension, &[])
        .await
        .expect_err("unavailable");
    assert!(matches!(err, WalletError::MissingController(_)));

    let err = controller.disconnect(&[]).await.expect_err("unavailable");
    assert!(matches!(err, WalletError::MissingController(_)));
}

#[tokio::test]
async fn missing_controller_surfaces_a_provider_error() {
    let hub = WalletHub::new(Arc::new(ChainRegistry::with_default_chains()), Vec::new());

    let err = hub
        .connect(ConnectionMode::Extension, &[osmosis()])
        .await
        .expect_err("no controller");
    assert!(matches!(err, WalletError::MissingController(_)));
}
