use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, ProofOfWork};
use crate::transaction::Transfer;

/// A sealed batch of transfers linked to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub proof: u64,
    pub previous_hash: String,
    pub data: Vec<Transfer>,
    pub timestamp: i64, // microseconds since Unix epoch (UTC)
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self {
            index: 0,
            proof: 0,
            previous_hash: String::from(GENESIS_PREVIOUS_HASH),
            data: Vec::new(),
            timestamp: Utc::now().timestamp_micros(),
        }
    }

    /// Create a block whose timestamp is strictly later than `after`,
    /// even when the clock has not advanced since the previous block.
    pub fn new(
        index: u64,
        proof: u64,
        previous_hash: String,
        data: Vec<Transfer>,
        after: i64,
    ) -> Self {
        Self {
            index,
            proof,
            previous_hash,
            data,
            timestamp: Utc::now().timestamp_micros().max(after.saturating_add(1)),
        }
    }

    /// Canonical encoding: a JSON object with keys sorted at every level,
    /// so field order in the struct never affects the digest.
    pub fn canonical_json(&self) -> String {
        json!({
            "data": self.data,
            "index": self.index,
            "previous_hash": self.previous_hash,
            "proof": self.proof,
            "timestamp": self.timestamp,
        })
        .to_string()
    }

    /// SHA-256 over the canonical encoding of every field, hex encoded.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_json().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether `self` may legally follow `previous`: consecutive index,
    /// matching link, later timestamp and a proof accepted by `pow`.
    pub fn is_valid_successor(&self, previous: &Block, pow: &ProofOfWork) -> bool {
        previous.index.checked_add(1) == Some(self.index)
            && self.previous_hash == previous.compute_hash()
            && self.timestamp > previous.timestamp
            && pow.verify(self.proof, previous.proof)
    }
}

/// Read-only projection of a block for callers outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockView {
    pub index: u64,
    pub proof: u64,
    pub hash: String,
    pub previous_hash: String,
    pub data: Vec<Transfer>,
    pub timestamp: i64,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            proof: block.proof,
            hash: block.compute_hash(),
            previous_hash: block.previous_hash.clone(),
            data: block.data.clone(),
            timestamp: block.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::blockchain::ProofOfWork;
    use crate::transaction::Transfer;

    fn transfer(sender: &str, receiver: &str, amount: u64) -> Transfer {
        Transfer {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            asset: None,
        }
    }

    fn successor_of(previous: &Block, pow: &ProofOfWork) -> Block {
        Block::new(
            previous.index + 1,
            pow.solve(previous.proof),
            previous.compute_hash(),
            vec![transfer("0", "alice", 10)],
            previous.timestamp,
        )
    }

    #[test]
    fn genesis_is_sentinel() {
        let b = Block::genesis();
        assert_eq!(b.index, 0);
        assert_eq!(b.proof, 0);
        assert_eq!(b.previous_hash, "0");
        assert!(b.data.is_empty());
    }

    #[test]
    fn hash_is_deterministic() {
        let b = Block::genesis();
        assert_eq!(b.compute_hash(), b.compute_hash());
        assert_eq!(b.compute_hash(), b.clone().compute_hash());
        assert_eq!(b.compute_hash().len(), 64);
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let mut b = Block::genesis();
        b.data.push(transfer("0", "alice", 5));
        let json = b.canonical_json();
        let positions: Vec<usize> = ["\"data\"", "\"index\"", "\"previous_hash\"", "\"proof\"", "\"timestamp\""]
            .iter()
            .map(|k| json.find(k).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.find("\"amount\"").unwrap() < json.find("\"asset\"").unwrap());
    }

    #[test]
    fn any_field_change_changes_hash() {
        let mut base = Block::genesis();
        base.data.push(transfer("0", "alice", 5));
        let original = base.compute_hash();

        let mut b = base.clone();
        b.index += 1;
        assert_ne!(original, b.compute_hash());

        let mut b = base.clone();
        b.proof += 1;
        assert_ne!(original, b.compute_hash());

        let mut b = base.clone();
        b.previous_hash = "1".into();
        assert_ne!(original, b.compute_hash());

        let mut b = base.clone();
        b.timestamp += 1;
        assert_ne!(original, b.compute_hash());

        let mut b = base.clone();
        b.data[0].amount = 6;
        assert_ne!(original, b.compute_hash());

        let mut b = base;
        b.data[0].asset = Some("0xart".into());
        assert_ne!(original, b.compute_hash());
    }

    #[test]
    fn mined_successor_is_valid() {
        let pow = ProofOfWork::new(1);
        let genesis = Block::genesis();
        let next = successor_of(&genesis, &pow);
        assert!(next.timestamp > genesis.timestamp);
        assert!(next.is_valid_successor(&genesis, &pow));
    }

    #[test]
    fn successor_rules_reject_each_broken_condition() {
        let pow = ProofOfWork::new(1);
        let genesis = Block::genesis();
        let good = successor_of(&genesis, &pow);

        let mut b = good.clone();
        b.index = 2;
        assert!(!b.is_valid_successor(&genesis, &pow));

        let mut b = good.clone();
        b.previous_hash = "deadbeef".into();
        assert!(!b.is_valid_successor(&genesis, &pow));

        let mut b = good.clone();
        b.timestamp = genesis.timestamp;
        assert!(!b.is_valid_successor(&genesis, &pow));

        let mut b = good;
        b.proof = (0..).find(|p| !pow.verify(*p, genesis.proof)).unwrap();
        assert!(!b.is_valid_successor(&genesis, &pow));
    }

    #[test]
    fn successor_breaks_when_predecessor_mutated() {
        let pow = ProofOfWork::new(1);
        let mut genesis = Block::genesis();
        let next = successor_of(&genesis, &pow);
        genesis.data.push(transfer("0", "mallory", 1_000));
        assert!(!next.is_valid_successor(&genesis, &pow));
    }
}
