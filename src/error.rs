use thiserror::Error;

/// Faults raised by the ledger engine. Declined transfers are not faults
/// and live in [`crate::transaction::Rejection`] instead.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot contains no genesis block")]
    EmptySnapshot,

    #[error("invalid chain link at block #{index}")]
    InvalidChain { index: u64 },

    #[error("stored block #{index} is missing from the chain being saved")]
    Tampered { index: u64 },

    #[error("replay of block #{block}: {address} spends asset {asset} it does not own")]
    AssetNotOwned {
        address: String,
        asset: String,
        block: u64,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
