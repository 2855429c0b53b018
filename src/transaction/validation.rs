use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{SYSTEM_ADDRESS, Transfer, TransferRequest};
use crate::wallet::WalletView;

/// Why a proposed transfer was declined. A rejection is a business
/// outcome, not a fault: nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("sender or receiver missing")]
    MissingParty,
    #[error("sender and receiver are the same address")]
    SelfTransfer,
    #[error("receiver cannot be the system address")]
    SystemReceiver,
    #[error("transfer moves neither an amount nor an asset")]
    EmptyTransfer,
    #[error("transfer moves both an amount and an asset")]
    AmountWithAsset,
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("sender {0} is not a known address")]
    UnknownSender(String),
    #[error("receiver {0} is not a known address")]
    UnknownReceiver(String),
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i128, need: u64 },
    #[error("sender does not own asset {0}")]
    AssetNotOwned(String),
    #[error("ledger replay failed: {0}")]
    Ledger(String),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Stateless checks, in order: parties present and distinct, receiver not
/// the mint, exactly one of amount/asset, non-negative amount.
pub fn check_shape(request: &TransferRequest) -> Result<Transfer, Rejection> {
    let (Some(sender), Some(receiver)) = (present(&request.sender), present(&request.receiver))
    else {
        return Err(Rejection::MissingParty);
    };
    if sender == receiver {
        return Err(Rejection::SelfTransfer);
    }
    if receiver == SYSTEM_ADDRESS {
        return Err(Rejection::SystemReceiver);
    }

    let asset = present(&request.asset);
    match (request.amount > 0, asset.is_some()) {
        (false, false) => return Err(Rejection::EmptyTransfer),
        (true, true) => return Err(Rejection::AmountWithAsset),
        _ => {}
    }
    let amount = u64::try_from(request.amount).map_err(|_| Rejection::NegativeAmount)?;

    Ok(Transfer {
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        amount,
        asset: asset.map(str::to_string),
    })
}

pub fn check_sender_known(transfer: &Transfer, known: &BTreeSet<String>) -> Result<(), Rejection> {
    if transfer.is_mint() || known.contains(&transfer.sender) {
        Ok(())
    } else {
        Err(Rejection::UnknownSender(transfer.sender.clone()))
    }
}

/// Balance and ownership check against the sender's spendable view.
pub fn check_funds(transfer: &Transfer, view: &WalletView) -> Result<(), Rejection> {
    if view.balance < i128::from(transfer.amount) {
        return Err(Rejection::InsufficientBalance {
            have: view.balance,
            need: transfer.amount,
        });
    }
    if let Some(asset) = &transfer.asset {
        if !view.assets.contains(asset) {
            return Err(Rejection::AssetNotOwned(asset.clone()));
        }
    }
    Ok(())
}
