//! Wire-shaped types exchanged with wallet sessions: transfer messages,
//! fees, signatures, and broadcast acknowledgements.

use serde::{Deserialize, Serialize};

use crate::domain::Coin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAlgo {
    Secp256k1,
    Ed25519,
    Sr25519,
}

/// A bank send message: the only message kind the workbench constructs
/// itself (the self-transfer used by Broadcast-Transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMsg {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

/// A transaction before fee attachment and signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub msgs: Vec<TransferMsg>,
    pub memo: String,
}

/// Fee quoted by a session's estimator and then attached verbatim at
/// sign-and-broadcast time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas: String,
}

/// Account material a session exposes to integrations: the printable
/// address plus the key algorithm and base64-encoded public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub address: String,
    pub algo: KeyAlgo,
    pub pub_key_b64: String,
}

/// Result of signing a free-form message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrarySignature {
    pub algo: KeyAlgo,
    pub pub_key_b64: String,
    pub signature_b64: String,
}

/// Broadcast acknowledgement returned by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    pub code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_log: Option<String>,
}

impl TxResponse {
    pub fn accepted(&self) -> bool {
        self.code == 0
    }
}
