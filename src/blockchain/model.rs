use std::collections::BTreeSet;

use log::{debug, error, info, warn};
use serde::Serialize;

use super::{Block, BlockView, ChainSettings, GENESIS_PREVIOUS_HASH, ProofOfWork};
use crate::error::{LedgerError, Result};
use crate::storage::SnapshotStore;
use crate::transaction::validation::{check_funds, check_sender_known, check_shape};
use crate::transaction::{Rejection, SYSTEM_ADDRESS, Transfer, TransferRequest};
use crate::wallet::{self, AddressPolicy, WalletView};

/// Check the genesis shape and every consecutive link of `blocks`.
pub fn validate_chain(blocks: &[Block], settings: &ChainSettings) -> Result<()> {
    let genesis = blocks.first().ok_or(LedgerError::EmptySnapshot)?;
    if genesis.index != 0
        || genesis.proof != 0
        || genesis.previous_hash != GENESIS_PREVIOUS_HASH
    {
        return Err(LedgerError::InvalidChain {
            index: genesis.index,
        });
    }

    for pair in blocks.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if !block.is_valid_successor(previous, &settings.proof_of_work_at(block.index)) {
            return Err(LedgerError::InvalidChain { index: block.index });
        }
    }
    Ok(())
}

/// One page of block views plus where the next page starts, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub blocks: Vec<BlockView>,
    pub next_start: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub height: usize,
    pub difficulty: usize,
    pub pending: usize,
    pub transaction_count: usize,
}

/// Single-writer ledger: the confirmed chain, the pending buffer and the
/// snapshot store it persists to. Callers must serialize access.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pending: Vec<Transfer>,
    difficulty: usize,
    settings: ChainSettings,
    store: SnapshotStore,
}

impl Blockchain {
    /// Load the newest valid snapshot from `store`, or start a fresh
    /// genesis chain when there is none or it fails validation.
    pub fn open(settings: ChainSettings, store: SnapshotStore) -> Self {
        let mut bc = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            difficulty: settings.base_difficulty,
            settings,
            store,
        };
        bc.reload();
        bc
    }

    /// Replace the in-memory chain with the newest durable snapshot.
    /// Returns `false` and falls back to a fresh genesis chain when no
    /// valid snapshot can be loaded. Pending transfers are dropped.
    pub fn reload(&mut self) -> bool {
        self.pending.clear();
        match self.load_stored_chain() {
            Some(blocks) => {
                self.chain.clear();
                for block in blocks {
                    self.add_block(block);
                }
                info!(
                    "LEDGER - loaded {} blocks from {}",
                    self.chain.len(),
                    self.store.dir().display()
                );
                true
            }
            None => {
                self.build_genesis();
                false
            }
        }
    }

    fn load_stored_chain(&self) -> Option<Vec<Block>> {
        match self.store.load_latest(&self.settings) {
            Ok(Some(blocks)) => Some(blocks),
            Ok(None) => {
                info!("LEDGER - no snapshot in {}", self.store.dir().display());
                None
            }
            Err(LedgerError::Io(e)) => {
                error!("LEDGER - snapshot storage unreadable: {e}");
                None
            }
            Err(e) => {
                warn!("LEDGER - latest snapshot rejected: {e}");
                None
            }
        }
    }

    fn build_genesis(&mut self) {
        self.chain.clear();
        self.add_block(Block::genesis());
        info!("LEDGER - built fresh genesis block");
        self.persist();
    }

    /// Append and recompute the difficulty for the next block.
    fn add_block(&mut self, block: Block) {
        self.chain.push(block);
        self.difficulty = self.settings.difficulty_at(self.chain.len() as u64);
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transfer] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Whole in-memory chain against the successor rules.
    pub fn is_valid_chain(&self) -> bool {
        validate_chain(&self.chain, &self.settings).is_ok()
    }

    /// Pending transfers that make their parties known addresses under the
    /// active policy. Spendable balances always include the whole buffer.
    fn recognized_pending(&self) -> &[Transfer] {
        match self.settings.address_policy {
            AddressPolicy::RecognizePending => &self.pending[..],
            AddressPolicy::ConfirmedOnly => &self.pending[..0],
        }
    }

    fn known_addresses(&self) -> BTreeSet<String> {
        wallet::all_addresses(&self.chain, self.recognized_pending())
    }

    /* -------------------- Assembler -------------------- */

    /// Validate `request` against current state and buffer it. Returns the
    /// sealed block when the buffer reached the batch size. A rejection
    /// leaves every piece of state untouched.
    fn submit(
        &mut self,
        request: &TransferRequest,
    ) -> std::result::Result<Option<Block>, Rejection> {
        let transfer = match self.admit(request) {
            Ok(transfer) => transfer,
            Err(rejection) => {
                warn!(
                    "LEDGER - declined transfer {:?} -> {:?}: {rejection}",
                    request.sender, request.receiver
                );
                return Err(rejection);
            }
        };

        let before = self.pending.len();
        self.pending.push(transfer);
        debug!(
            "LEDGER - transfer accepted (pending: {} -> {})",
            before,
            self.pending.len()
        );

        if self.pending.len() >= self.settings.batch_size {
            return Ok(Some(self.seal_pending()));
        }
        Ok(None)
    }

    fn admit(&self, request: &TransferRequest) -> std::result::Result<Transfer, Rejection> {
        let transfer = check_shape(request)?;
        check_sender_known(&transfer, &self.known_addresses())?;

        if !transfer.is_mint() {
            let view = wallet::replay(&transfer.sender, &self.chain, &self.pending)
                .map_err(|e| {
                    error!("LEDGER - replay invariant violated: {e}");
                    Rejection::Ledger(e.to_string())
                })?;
            check_funds(&transfer, &view)?;
        }
        Ok(transfer)
    }

    /// Accept or decline a transfer. `Ok` carries the block sealed by this
    /// submission, if any; `Err` says why the transfer was declined.
    pub fn submit_transfer(
        &mut self,
        request: &TransferRequest,
    ) -> std::result::Result<Option<BlockView>, Rejection> {
        self.submit(request).map(|sealed| sealed.as_ref().map(BlockView::from))
    }

    /// Mine a block over the pending buffer, append it, empty the buffer
    /// and persist. The block stays appended even if the save fails.
    fn seal_pending(&mut self) -> Block {
        let (previous_proof, previous_hash, previous_timestamp) = {
            let last = self.last_block();
            (last.proof, last.compute_hash(), last.timestamp)
        };
        let pow = ProofOfWork::new(self.difficulty);
        let proof = pow.solve(previous_proof);

        let block = Block::new(
            self.chain.len() as u64,
            proof,
            previous_hash,
            std::mem::take(&mut self.pending),
            previous_timestamp,
        );
        self.add_block(block.clone());
        info!(
            "LEDGER - sealed block #{} (proof={}, transfers={}, difficulty={})",
            block.index,
            block.proof,
            block.data.len(),
            pow.difficulty()
        );

        self.persist();
        block
    }

    /// Seal whatever is pending, possibly nothing, into a new block.
    pub fn force_seal(&mut self) -> BlockView {
        BlockView::from(&self.seal_pending())
    }

    /* -------------------- Persistence -------------------- */

    /// Durable save; `false` when the tamper guard or storage refuses it.
    pub fn persist(&self) -> bool {
        match self.store.save(&self.chain, &self.settings) {
            Ok(_) => true,
            Err(e @ LedgerError::Tampered { .. }) => {
                warn!("LEDGER - save refused: {e}");
                false
            }
            Err(e) => {
                error!("LEDGER - save failed: {e}");
                false
            }
        }
    }

    /* -------------------- Accounting -------------------- */

    /// Confirmed balance and assets of `address`; `None` if the address is
    /// unknown.
    pub fn wallet_of(&self, address: &str) -> Result<Option<WalletView>> {
        if !self.known_addresses().contains(address) {
            return Ok(None);
        }
        wallet::replay(address, &self.chain, &[]).map(Some)
    }

    pub fn list_addresses(&self) -> BTreeSet<String> {
        let mut addresses = self.known_addresses();
        addresses.remove(SYSTEM_ADDRESS);
        addresses
    }

    pub fn list_assets(&self) -> BTreeSet<String> {
        wallet::all_assets(&self.chain)
    }

    pub fn transaction_count(&self) -> usize {
        wallet::total_transaction_count(&self.chain)
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            height: self.len(),
            difficulty: self.difficulty,
            pending: self.pending.len(),
            transaction_count: self.transaction_count(),
        }
    }

    /// Mint a new address funded with `grant` and make it confirmed.
    pub fn register_address(
        &mut self,
        grant: u64,
    ) -> std::result::Result<(String, BlockView), Rejection> {
        let address = wallet::generate_address();
        let amount = i64::try_from(grant).map_err(|_| Rejection::NegativeAmount)?;
        let request = TransferRequest::new(SYSTEM_ADDRESS, address.as_str(), amount, None);
        let block = self.submit_and_seal(&request)?;
        info!("LEDGER - registered address {address} with {grant}");
        Ok((address, block))
    }

    /// Mint a new asset owned by `owner` and make it confirmed.
    pub fn register_asset(
        &mut self,
        owner: &str,
    ) -> std::result::Result<(String, BlockView), Rejection> {
        if owner != SYSTEM_ADDRESS && !self.known_addresses().contains(owner) {
            warn!("LEDGER - asset owner {owner} is not a known address");
            return Err(Rejection::UnknownReceiver(owner.to_string()));
        }
        let asset = wallet::generate_asset_id();
        let request = TransferRequest::new(SYSTEM_ADDRESS, owner, 0, Some(asset.clone()));
        let block = self.submit_and_seal(&request)?;
        info!("LEDGER - registered asset {asset} for {owner}");
        Ok((asset, block))
    }

    fn submit_and_seal(
        &mut self,
        request: &TransferRequest,
    ) -> std::result::Result<BlockView, Rejection> {
        match self.submit(request)? {
            Some(block) => Ok(BlockView::from(&block)),
            None => Ok(self.force_seal()),
        }
    }

    /* -------------------- Pagination -------------------- */

    /// Exactly `count` blocks from `start`; `None` when the range does not
    /// fit inside the chain.
    pub fn get_blocks(&self, start: usize, count: usize) -> Option<Vec<BlockView>> {
        if start >= self.chain.len() || count == 0 || count > self.chain.len() - start {
            return None;
        }
        Some(
            self.chain[start..start + count]
                .iter()
                .map(BlockView::from)
                .collect(),
        )
    }

    /// Up to `size` blocks from `start`, with the start of the following
    /// page when more blocks remain.
    pub fn page(&self, start: usize, size: usize) -> Option<Page> {
        let remaining = self.chain.len().checked_sub(start)?;
        let blocks = self.get_blocks(start, size.min(remaining))?;
        let end = start + blocks.len();
        Some(Page {
            blocks,
            next_start: (end < self.chain.len()).then_some(end),
        })
    }
}
