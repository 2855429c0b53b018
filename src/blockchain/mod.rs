pub mod block;
pub mod model;
pub mod pow;

pub use block::{Block, BlockView};
pub use model::{Blockchain, validate_chain};
pub use pow::ProofOfWork;

use crate::wallet::AddressPolicy;

/// Starting Proof-of-Work difficulty (leading hex zeros).
pub const DIFFICULTY_START: usize = 2;

/// Chain length interval after which difficulty grows by one.
pub const DIFFICULTY_INCREASE_STEP: u64 = 1000;

/// Pending transfers sealed into one block.
pub const TRANSACTIONS_PER_BLOCK: usize = 3;

/// `previous_hash` carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Per-chain rules. Each `Blockchain` owns its own copy, so several
/// engines can live in one process without sharing difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSettings {
    pub base_difficulty: usize,
    pub difficulty_step: u64,
    pub batch_size: usize,
    pub address_policy: AddressPolicy,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            base_difficulty: DIFFICULTY_START,
            difficulty_step: DIFFICULTY_INCREASE_STEP,
            batch_size: TRANSACTIONS_PER_BLOCK,
            address_policy: AddressPolicy::default(),
        }
    }
}

impl ChainSettings {
    /// Difficulty for the block at `index`, i.e. the difficulty in force
    /// once the chain has grown to `index` blocks.
    pub fn difficulty_at(&self, index: u64) -> usize {
        let bumps = index.checked_div(self.difficulty_step).unwrap_or(0);
        self.base_difficulty
            .saturating_add(usize::try_from(bumps).unwrap_or(usize::MAX))
    }

    pub fn proof_of_work_at(&self, index: u64) -> ProofOfWork {
        ProofOfWork::new(self.difficulty_at(index))
    }
}
