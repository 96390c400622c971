//! UI/backend events and error modeling for the workbench controller.

use shared::error::{WalletError, WalletErrorKind};
use shared::tx::{ArbitrarySignature, TxResponse};
use wallet_core::adapter::WidgetAccount;
use wallet_core::SessionSummary;

pub enum UiEvent {
    BackendReady,
    Info(String),
    SessionsChanged(Vec<SessionSummary>),
    SignCompleted(ArbitrarySignature),
    BroadcastCompleted(TxResponse),
    WidgetAccountLoaded {
        account: WidgetAccount,
        direct_signing: bool,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    Disconnect,
    Sign,
    Broadcast,
    Widget,
    General,
}

pub fn err_label(kind: WalletErrorKind) -> &'static str {
    match kind {
        WalletErrorKind::UnknownChain => "Chain registry",
        WalletErrorKind::NotConnected => "Wallet",
        WalletErrorKind::Provider => "Provider",
        WalletErrorKind::Network => "Network",
        WalletErrorKind::Capability => "Capability",
        WalletErrorKind::Other => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    kind: WalletErrorKind,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_wallet_error(context: UiErrorContext, err: &WalletError) -> Self {
        Self {
            kind: err.kind(),
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            kind: WalletErrorKind::Other,
            context,
            message: message.into(),
        }
    }

    /// Whether the fix is simply connecting a wallet first.
    pub fn needs_connect(&self) -> bool {
        self.kind == WalletErrorKind::NotConnected
    }

    pub fn kind(&self) -> WalletErrorKind {
        self.kind
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
