use serde::{Deserialize, Serialize};

/// Minting authority. Transfers from it create value from nothing and
/// skip balance checks.
pub const SYSTEM_ADDRESS: &str = "0";

/// A movement of currency or of one unique asset between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    #[serde(default)]
    pub asset: Option<String>,
}

impl Transfer {
    pub fn is_mint(&self) -> bool {
        self.sender == SYSTEM_ADDRESS
    }
}

/// Unvalidated transfer as proposed by a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferRequest {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    #[serde(default)]
    pub amount: i64,
    pub asset: Option<String>,
}

impl TransferRequest {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: i64,
        asset: Option<String>,
    ) -> Self {
        Self {
            sender: Some(sender.into()),
            receiver: Some(receiver.into()),
            amount,
            asset,
        }
    }
}
