use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use shared::domain::{ChainId, ConnectionMode, WalletProvider};
use shared::registry::ChainRegistry;
use wallet_core::softkey::{SoftKeyController, DEV_MNEMONIC};
use wallet_core::{WalletController, WalletHub};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "osmosis-1")]
    chain: String,
    #[arg(long, default_value = "leap")]
    provider: String,
    #[arg(long, default_value = "extension")]
    mode: String,
    #[arg(long, default_value = DEV_MNEMONIC)]
    mnemonic: String,
    /// Stop after signing; skip the self-transfer broadcast.
    #[arg(long)]
    skip_broadcast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let provider: WalletProvider = args.provider.parse()?;
    let mode: ConnectionMode = args.mode.parse()?;
    let chain_id = ChainId::new(args.chain);

    let registry = Arc::new(ChainRegistry::with_default_chains());
    let controller =
        Arc::new(SoftKeyController::new(provider, &args.mnemonic)?) as Arc<dyn WalletController>;
    let hub = WalletHub::new(registry, vec![controller]);
    hub.start_event_reconciliation();
    hub.select_provider(provider).await;
    hub.select_mode(mode).await;
    hub.select_chain(chain_id.clone()).await?;

    let sessions = hub.connect(mode, std::slice::from_ref(&chain_id)).await?;
    for session in &sessions {
        println!(
            "connected {} via {} on {}",
            session.address,
            session.provider.label(),
            session.chain_id
        );
    }

    let signature = hub.sign_arbitrary().await?;
    println!("signature: {}", serde_json::to_string_pretty(&signature)?);

    if !args.skip_broadcast {
        let response = hub.broadcast_transfer().await?;
        println!("broadcast: {}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
