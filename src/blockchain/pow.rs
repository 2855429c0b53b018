use log::debug;
use sha2::{Digest, Sha256};

/// Search-based cost gate for sealing blocks.
///
/// This only paces block creation for a single trusted writer. It is not a
/// consensus protocol and gives no protection against an adversary: a
/// proof can be brute-forced by anyone in `16^difficulty` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// The guess is the decimal `candidate² - previous²`; it passes when its
    /// SHA-256 hex digest starts with `difficulty` zeros.
    pub fn verify(&self, candidate: u64, previous: u64) -> bool {
        let c = u128::from(candidate) * u128::from(candidate);
        let p = u128::from(previous) * u128::from(previous);
        let guess = if c >= p {
            (c - p).to_string()
        } else {
            format!("-{}", p - c)
        };

        let mut hasher = Sha256::new();
        hasher.update(guess.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest.bytes().take_while(|b| *b == b'0').count() >= self.difficulty
    }

    /// Exhaustive forward search from 0. Blocks the calling thread until a
    /// proof is found; there is no timeout.
    pub fn solve(&self, previous: u64) -> u64 {
        let mut proof = 0u64;
        while !self.verify(proof, previous) {
            proof += 1;
        }
        debug!(
            "POW - solved proof={} for previous={} (difficulty={})",
            proof, previous, self.difficulty
        );
        proof
    }
}
