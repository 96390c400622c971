//! Command orchestration helpers from UI actions to the backend queue.

use tokio::sync::mpsc::{error::TrySendError, Sender};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::SelectChain { .. } => "select_chain",
        BackendCommand::SelectProvider { .. } => "select_provider",
        BackendCommand::SelectMode { .. } => "select_mode",
        BackendCommand::Connect => "connect",
        BackendCommand::Disconnect => "disconnect",
        BackendCommand::SignArbitrary => "sign_arbitrary",
        BackendCommand::BroadcastTransfer => "broadcast_transfer",
        BackendCommand::WidgetFetchAccount { .. } => "widget_fetch_account",
        BackendCommand::SimulateExternalDisconnect { .. } => "simulate_external_disconnect",
        BackendCommand::SimulateAccountChange { .. } => "simulate_account_change",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Closed(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}
