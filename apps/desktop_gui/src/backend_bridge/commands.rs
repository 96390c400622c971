//! Backend commands queued from UI to the backend worker.

use shared::domain::{ChainId, ConnectionMode, WalletProvider};

pub enum BackendCommand {
    SelectChain {
        chain_id: ChainId,
    },
    SelectProvider {
        provider: WalletProvider,
    },
    SelectMode {
        mode: ConnectionMode,
    },
    Connect,
    Disconnect,
    SignArbitrary,
    BroadcastTransfer,
    WidgetFetchAccount {
        chain_id: ChainId,
    },
    SimulateExternalDisconnect {
        chain_id: ChainId,
    },
    SimulateAccountChange {
        chain_id: ChainId,
    },
}
