mod backend_bridge;
mod controller;
mod ui;

use crossbeam_channel::bounded;
use eframe::egui;
use tokio::sync::mpsc;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::app::{PersistedUiSettings, WorkbenchApp, SETTINGS_STORAGE_KEY};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Cosmos Wallet Workbench")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([860.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Cosmos Wallet Workbench",
        options,
        Box::new(|cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedUiSettings>(&text).ok())
            });
            Ok(Box::new(WorkbenchApp::new(cmd_tx, ui_rx, persisted)))
        }),
    )
}
