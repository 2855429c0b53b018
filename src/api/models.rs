use crate::blockchain::{BlockView, Blockchain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Shared application state: one ledger, serialized behind a mutex.
pub struct AppState {
    pub ledger: Mutex<Blockchain>,
    pub signup_grant: u64,
}

impl AppState {
    pub fn new(ledger: Blockchain, signup_grant: u64) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            signup_grant,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: usize,
}

#[derive(Deserialize)]
pub struct BlocksQuery {
    pub start: Option<usize>,
    pub size: Option<usize>,
}

/* ---------- TX API Models ---------- */

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub error: Option<String>,
    pub new_block: Option<BlockView>,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: usize,
}

/* ---------- Address / Asset API Models ---------- */

#[derive(Serialize)]
pub struct AddressesResponse {
    pub addresses: BTreeSet<String>,
}

#[derive(Serialize)]
pub struct NewAddressResponse {
    pub address: String,
    pub new_block: BlockView,
}

#[derive(Serialize)]
pub struct AssetsResponse {
    pub assets: BTreeSet<String>,
}

#[derive(Deserialize)]
pub struct NewAssetRequest {
    pub owner: String,
}

#[derive(Serialize)]
pub struct NewAssetResponse {
    pub asset: String,
    pub owner: String,
    pub new_block: BlockView,
}

#[derive(Serialize)]
pub struct WalletResponse {
    pub address: String,
    pub balance: i128,
    pub assets: BTreeSet<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
