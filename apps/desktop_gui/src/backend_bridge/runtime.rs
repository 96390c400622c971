//! Runtime bridge between the UI command queue and the backend worker.

use crossbeam_channel::Sender;
use tokio::sync::mpsc::Receiver;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    crate::ui::app::start_backend_worker(cmd_rx, ui_tx);
}
