use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{ChainId, ConnectionMode, WalletProvider};
use shared::error::WalletError;
use shared::registry::ChainRegistry;
use shared::tx::{ArbitrarySignature, TxResponse};
use tokio::sync::mpsc;
use wallet_core::adapter::{HubWidgetClient, WidgetAccount, WidgetConfig, WidgetTheme, WidgetWalletClient};
use wallet_core::softkey::SoftKeyController;
use wallet_core::{HubEvent, SessionSummary, WalletController, WalletHub};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "wallet_workbench_ui_settings";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedUiSettings {
    pub theme: WidgetTheme,
    pub selected_chain: String,
    pub selected_provider: WalletProvider,
    pub selected_mode: ConnectionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

struct WidgetPanelState {
    open: bool,
    config: WidgetConfig,
    theme: WidgetTheme,
    account: Option<WidgetAccount>,
    direct_signing: Option<bool>,
}

impl WidgetPanelState {
    fn new(theme: WidgetTheme) -> Self {
        Self {
            open: false,
            config: WidgetConfig::default(),
            theme,
            account: None,
            direct_signing: None,
        }
    }
}

pub struct WorkbenchApp {
    cmd_tx: mpsc::Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    chain_options: Vec<(ChainId, &'static str)>,
    selected_chain: ChainId,
    selected_provider: WalletProvider,
    selected_mode: ConnectionMode,
    sessions: Vec<SessionSummary>,
    status: String,
    status_banner: Option<StatusBanner>,
    last_signature: Option<ArbitrarySignature>,
    last_broadcast: Option<TxResponse>,
    widget: WidgetPanelState,
    backend_ready: bool,
    applied_theme: Option<WidgetTheme>,
}

impl WorkbenchApp {
    pub fn new(
        cmd_tx: mpsc::Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedUiSettings>,
    ) -> Self {
        let registry = ChainRegistry::with_default_chains();
        let chain_options: Vec<(ChainId, &'static str)> = registry
            .chain_ids()
            .map(|chain_id| {
                let name = registry.display_name(chain_id).unwrap_or("Unknown");
                (chain_id.clone(), name)
            })
            .collect();

        let mut selected_chain = chain_options[0].0.clone();
        let mut selected_provider = WalletProvider::Leap;
        let mut selected_mode = ConnectionMode::Extension;
        let mut theme = WidgetTheme::Light;
        if let Some(persisted) = persisted {
            let restored = ChainId::new(persisted.selected_chain);
            if chain_options.iter().any(|(chain_id, _)| *chain_id == restored) {
                selected_chain = restored;
            }
            selected_provider = persisted.selected_provider;
            selected_mode = persisted.selected_mode;
            theme = persisted.theme;
        }

        Self {
            cmd_tx,
            ui_rx,
            chain_options,
            selected_chain,
            selected_provider,
            selected_mode,
            sessions: Vec::new(),
            status: "Backend worker starting...".to_string(),
            status_banner: None,
            last_signature: None,
            last_broadcast: None,
            widget: WidgetPanelState::new(theme),
            backend_ready: false,
            applied_theme: None,
        }
    }

    fn chain_label(&self, chain_id: &ChainId) -> &'static str {
        self.chain_options
            .iter()
            .find(|(candidate, _)| candidate == chain_id)
            .map(|(_, name)| *name)
            .unwrap_or("Unknown")
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn push_selection(&mut self) {
        let chain_id = self.selected_chain.clone();
        let provider = self.selected_provider;
        let mode = self.selected_mode;
        self.dispatch(BackendCommand::SelectChain { chain_id });
        self.dispatch(BackendCommand::SelectProvider { provider });
        self.dispatch(BackendCommand::SelectMode { mode });
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::BackendReady => {
                    self.backend_ready = true;
                    self.status = "Backend worker ready".to_string();
                    self.push_selection();
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::SessionsChanged(sessions) => {
                    self.sessions = sessions;
                    self.status = format!("{} connected session(s)", self.sessions.len());
                }
                UiEvent::SignCompleted(signature) => {
                    self.status = "Sign success".to_string();
                    self.status_banner = None;
                    self.last_signature = Some(signature);
                }
                UiEvent::BroadcastCompleted(response) => {
                    self.status = format!("Broadcast success; tx hash {}", response.txhash);
                    self.status_banner = None;
                    self.last_broadcast = Some(response);
                }
                UiEvent::WidgetAccountLoaded {
                    account,
                    direct_signing,
                } => {
                    self.widget.account = Some(account);
                    self.widget.direct_signing = Some(direct_signing);
                }
                UiEvent::Error(err) => {
                    self.status = if err.needs_connect() {
                        "Wallet not connected yet".to_string()
                    } else {
                        format!("{} error: {}", err_label(err.kind()), err.message())
                    };
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: self.status.clone(),
                    });
                    if err.context() == UiErrorContext::Widget {
                        self.widget.account = None;
                        self.widget.direct_signing = None;
                    }
                }
            }
        }
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if self.applied_theme == Some(self.widget.theme) {
            return;
        }
        match self.widget.theme {
            WidgetTheme::Light => ctx.set_visuals(egui::Visuals::light()),
            WidgetTheme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        }
        self.applied_theme = Some(self.widget.theme);
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        let StatusBannerSeverity::Error = banner.severity;
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(84, 28, 28))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&banner.message)
                            .color(egui::Color32::from_rgb(255, 210, 210)),
                    );
                    if ui.button("Dismiss").clicked() {
                        self.status_banner = None;
                    }
                });
            });
    }

    fn show_selectors(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let previous_chain = self.selected_chain.clone();
            let selected_label = self.chain_label(&self.selected_chain);
            egui::ComboBox::from_id_salt("chain_select")
                .selected_text(selected_label)
                .show_ui(ui, |ui| {
                    for (chain_id, name) in &self.chain_options {
                        ui.selectable_value(&mut self.selected_chain, chain_id.clone(), *name);
                    }
                });
            if self.selected_chain != previous_chain {
                let chain_id = self.selected_chain.clone();
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::SelectChain { chain_id },
                    &mut self.status,
                );
            }

            let previous_provider = self.selected_provider;
            egui::ComboBox::from_id_salt("provider_select")
                .selected_text(self.selected_provider.label())
                .show_ui(ui, |ui| {
                    for provider in WalletProvider::ALL {
                        ui.selectable_value(&mut self.selected_provider, provider, provider.label());
                    }
                });
            if self.selected_provider != previous_provider {
                let provider = self.selected_provider;
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::SelectProvider { provider },
                    &mut self.status,
                );
            }

            let previous_mode = self.selected_mode;
            egui::ComboBox::from_id_salt("mode_select")
                .selected_text(self.selected_mode.label())
                .show_ui(ui, |ui| {
                    for mode in ConnectionMode::ALL {
                        ui.selectable_value(&mut self.selected_mode, mode, mode.label());
                    }
                });
            if self.selected_mode != previous_mode {
                let mode = self.selected_mode;
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::SelectMode { mode },
                    &mut self.status,
                );
            }
        });
    }

    fn show_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let ready = self.backend_ready;
            if ui.add_enabled(ready, egui::Button::new("Connect")).clicked() {
                self.dispatch(BackendCommand::Connect);
            }
            if ui
                .add_enabled(ready, egui::Button::new("Disconnect"))
                .clicked()
            {
                self.dispatch(BackendCommand::Disconnect);
            }
            if ui
                .add_enabled(ready, egui::Button::new("Sign Arbitrary"))
                .clicked()
            {
                self.dispatch(BackendCommand::SignArbitrary);
            }
            if ui
                .add_enabled(ready, egui::Button::new("Broadcast Tx"))
                .clicked()
            {
                self.dispatch(BackendCommand::BroadcastTransfer);
            }
        });
    }

    fn show_results(&mut self, ui: &mut egui::Ui) {
        if let Some(signature) = &self.last_signature {
            ui.horizontal(|ui| {
                ui.label("Last signature:");
                ui.monospace(truncate_middle(&signature.signature_b64, 28));
            });
        }
        if let Some(response) = &self.last_broadcast {
            ui.horizontal(|ui| {
                ui.label("Last tx hash:");
                ui.monospace(&response.txhash);
            });
        }
    }

    fn show_sessions(&mut self, ui: &mut egui::Ui) {
        ui.monospace("CONNECTED WALLETS");
        if self.sessions.is_empty() {
            ui.weak("none");
            return;
        }
        for session in &self.sessions {
            ui.monospace(format!(
                "{} | {} | {} | {}",
                short_address(&session.address),
                session.provider.label(),
                session.chain_id,
                session.connected_at.format("%H:%M:%S"),
            ));
        }
    }

    fn show_simulation(&mut self, ui: &mut egui::Ui) {
        ui.collapsing("Provider simulation", |ui| {
            ui.label("Fire the notices the wallet software would emit on its own.");
            ui.horizontal(|ui| {
                if ui.button("External disconnect").clicked() {
                    let chain_id = self.selected_chain.clone();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SimulateExternalDisconnect { chain_id },
                        &mut self.status,
                    );
                }
                if ui.button("Account change").clicked() {
                    let chain_id = self.selected_chain.clone();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SimulateAccountChange { chain_id },
                        &mut self.status,
                    );
                }
            });
        });
    }

    fn show_widget_window(&mut self, ctx: &egui::Context) {
        if !self.widget.open {
            return;
        }
        let mut open = self.widget.open;
        let title = self.widget.config.title.clone();
        egui::Window::new(title)
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&self.widget.config.subtitle);
                ui.separator();

                egui::ComboBox::from_id_salt("widget_theme")
                    .selected_text(match self.widget.theme {
                        WidgetTheme::Light => "Light",
                        WidgetTheme::Dark => "Dark",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.widget.theme, WidgetTheme::Light, "Light");
                        ui.selectable_value(&mut self.widget.theme, WidgetTheme::Dark, "Dark");
                    });

                match (&self.widget.account, self.widget.direct_signing) {
                    (Some(account), direct_signing) => {
                        ui.monospace(short_address(&account.address));
                        ui.label(format!("Key algo: {:?}", account.algo));
                        ui.label(format!("Public key bytes: {}", account.pub_key.len()));
                        match direct_signing {
                            Some(true) => ui.label("Direct signing: available"),
                            Some(false) => ui.label("Direct signing: not supported"),
                            None => ui.label("Direct signing: unknown"),
                        };
                    }
                    (None, _) => {
                        ui.weak("No account loaded yet.");
                    }
                }

                if ui.button("Refresh account").clicked() {
                    let chain_id = self.selected_chain.clone();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::WidgetFetchAccount { chain_id },
                        &mut self.status,
                    );
                }
            });
        self.widget.open = open;
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.apply_theme_if_needed(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cosmos Wallet Workbench");
            ui.label(&self.status);
            self.show_banner(ui);
            ui.separator();

            self.show_selectors(ui);
            ui.add_space(6.0);
            self.show_actions(ui);
            ui.add_space(6.0);
            self.show_results(ui);
            ui.separator();

            self.show_sessions(ui);
            ui.separator();

            if ui
                .add_enabled(self.backend_ready, egui::Button::new("Open Liquidity Widget"))
                .clicked()
            {
                self.widget.open = true;
                let chain_id = self.selected_chain.clone();
                self.dispatch(BackendCommand::WidgetFetchAccount { chain_id });
            }
            self.show_simulation(ui);
        });

        self.show_widget_window(ctx);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedUiSettings {
            theme: self.widget.theme,
            selected_chain: self.selected_chain.as_str().to_string(),
            selected_provider: self.selected_provider,
            selected_mode: self.selected_mode,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

fn short_address(address: &str) -> String {
    if address.len() <= 16 {
        return address.to_string();
    }
    format!(
        "{}...{}",
        &address[..10],
        &address[address.len() - 5..]
    )
}

fn truncate_middle(text: &str, keep: usize) -> String {
    if text.len() <= keep * 2 {
        return text.to_string();
    }
    format!("{}...{}", &text[..keep], &text[text.len() - keep..])
}

pub fn start_backend_worker(mut cmd_rx: mpsc::Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let registry = Arc::new(ChainRegistry::with_default_chains());

            let mut soft_controllers: HashMap<WalletProvider, Arc<SoftKeyController>> =
                HashMap::new();
            for provider in WalletProvider::ALL {
                match SoftKeyController::dev(provider) {
                    Ok(controller) => {
                        soft_controllers.insert(provider, Arc::new(controller));
                    }
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::BackendStartup,
                            format!("backend worker startup failure: {err}"),
                        )));
                        tracing::error!("failed to build {provider} controller: {err}");
                        return;
                    }
                }
            }
            let controllers: Vec<Arc<dyn WalletController>> = soft_controllers
                .values()
                .map(|controller| Arc::clone(controller) as Arc<dyn WalletController>)
                .collect();

            let hub = WalletHub::new(registry, controllers);
            hub.start_event_reconciliation();
            let widget_client = HubWidgetClient::new(Arc::clone(&hub));

            let mut hub_events = hub.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                while let Ok(event) = hub_events.recv().await {
                    match event {
                        HubEvent::SessionsChanged(sessions) => {
                            let _ = ui_tx_events.try_send(UiEvent::SessionsChanged(sessions));
                        }
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::BackendReady);

            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    BackendCommand::SelectChain { chain_id } => {
                        if let Err(err) = hub.select_chain(chain_id.clone()).await {
                            tracing::error!(chain = %chain_id, "backend: select_chain failed: {err}");
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_wallet_error(
                                UiErrorContext::General,
                                &err,
                            )));
                        }
                    }
                    BackendCommand::SelectProvider { provider } => {
                        hub.select_provider(provider).await;
                    }
                    BackendCommand::SelectMode { mode } => {
                        hub.select_mode(mode).await;
                    }
                    BackendCommand::Connect => {
                        let chain_id = hub.selected_chain().await;
                        let mode = hub.selected_mode().await;
                        tracing::info!(chain = %chain_id, "backend: connect");
                        if let Err(err) = hub
                            .connect(mode, std::slice::from_ref(&chain_id))
                            .await
                        {
                            tracing::error!(chain = %chain_id, "backend: connect failed: {err}");
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_wallet_error(
                                UiErrorContext::Connect,
                                &err,
                            )));
                        }
                    }
                    BackendCommand::Disconnect => {
                        tracing::info!("backend: disconnect");
                        if let Err(err) = hub.disconnect().await {
                            tracing::error!("backend: disconnect failed: {err}");
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_wallet_error(
                                UiErrorContext::Disconnect,
                                &err,
                            )));
                        }
                    }
                    BackendCommand::SignArbitrary => {
                        tracing::info!("backend: sign_arbitrary");
                        match hub.sign_arbitrary().await {
                            Ok(signature) => {
                                let _ = ui_tx.try_send(UiEvent::SignCompleted(signature));
                            }
                            Err(err) => {
                                tracing::error!("backend: sign_arbitrary failed: {err}");
                                let _ = ui_tx.try_send(UiEvent::Error(
                                    UiError::from_wallet_error(UiErrorContext::Sign, &err),
                                ));
                            }
                        }
                    }
                    BackendCommand::BroadcastTransfer => {
                        tracing::info!("backend: broadcast_transfer");
                        match hub.broadcast_transfer().await {
                            Ok(response) => {
                                let _ = ui_tx.try_send(UiEvent::BroadcastCompleted(response));
                            }
                            Err(err) => {
                                tracing::error!("backend: broadcast_transfer failed: {err}");
                                let _ = ui_tx.try_send(UiEvent::Error(
                                    UiError::from_wallet_error(UiErrorContext::Broadcast, &err),
                                ));
                            }
                        }
                    }
                    BackendCommand::WidgetFetchAccount { chain_id } => {
                        tracing::info!(chain = %chain_id, "backend: widget_fetch_account");
                        match widget_client.account(&chain_id).await {
                            Ok(account) => {
                                let direct_signing = match widget_client.signer(&chain_id).await {
                                    Ok(_) => true,
                                    Err(WalletError::UnsupportedCapability(_)) => false,
                                    Err(err) => {
                                        tracing::error!(
                                            chain = %chain_id,
                                            "backend: widget signer probe failed: {err}"
                                        );
                                        false
                                    }
                                };
                                let _ = ui_tx.try_send(UiEvent::WidgetAccountLoaded {
                                    account,
                                    direct_signing,
                                });
                            }
                            Err(err) => {
                                tracing::error!(
                                    chain = %chain_id,
                                    "backend: widget account fetch failed: {err}"
                                );
                                let _ = ui_tx.try_send(UiEvent::Error(
                                    UiError::from_wallet_error(UiErrorContext::Widget, &err),
                                ));
                            }
                        }
                    }
                    BackendCommand::SimulateExternalDisconnect { chain_id } => {
                        let provider = hub.selected_provider().await;
                        if let Some(controller) = soft_controllers.get(&provider) {
                            controller
                                .simulate_external_disconnect(std::slice::from_ref(&chain_id))
                                .await;
                            let _ = ui_tx.try_send(UiEvent::Info(format!(
                                "Simulated external disconnect for {chain_id}"
                            )));
                        }
                    }
                    BackendCommand::SimulateAccountChange { chain_id } => {
                        let provider = hub.selected_provider().await;
                        if let Some(controller) = soft_controllers.get(&provider) {
                            controller
                                .simulate_account_change(std::slice::from_ref(&chain_id))
                                .await;
                            let _ = ui_tx.try_send(UiEvent::Info(format!(
                                "Simulated account change for {chain_id}"
                            )));
                        }
                    }
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::{short_address, truncate_middle, UiError, UiErrorContext};
    use shared::domain::ChainId;
    use shared::error::{WalletError, WalletErrorKind};

    #[test]
    fn shortens_long_addresses_keeping_both_ends() {
        let address = "osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";
        let short = short_address(address);
        assert!(short.starts_with("osmo1qypqx"));
        assert!(short.ends_with("zv7xu"));
        assert!(short.contains("..."));
        assert_eq!(short_address("osmo1short"), "osmo1short");
    }

    #[test]
    fn truncate_middle_keeps_short_strings_intact() {
        assert_eq!(truncate_middle("abcdef", 4), "abcdef");
        let long = "a".repeat(100);
        let truncated = truncate_middle(&long, 10);
        assert_eq!(truncated.len(), 23);
    }

    #[test]
    fn wallet_errors_map_to_their_kind() {
        let err = UiError::from_wallet_error(
            UiErrorContext::Sign,
            &WalletError::NotConnected(ChainId::from("osmosis-1")),
        );
        assert!(err.needs_connect());
        assert_eq!(err.kind(), WalletErrorKind::NotConnected);
        assert_eq!(err.context(), UiErrorContext::Sign);

        let err = UiError::from_wallet_error(
            UiErrorContext::Widget,
            &WalletError::UnsupportedCapability("direct signing"),
        );
        assert!(!err.needs_connect());
        assert_eq!(err.kind(), WalletErrorKind::Capability);
    }
}
