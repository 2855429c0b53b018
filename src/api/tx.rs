use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};
use std::time::Instant;

use super::models::{AppState, CountResponse, SubmitResponse};
use crate::transaction::TransferRequest;

/// Submit a transfer. A declined transfer is still a 200 with
/// `success: false`; it is a business outcome, not a fault.
#[post("/transactions/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<TransferRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    debug!(
        "POST /transactions/ - received: sender={:?}, receiver={:?}, amount={}, asset={:?}",
        body.sender, body.receiver, body.amount, body.asset
    );

    let outcome = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.submit_transfer(&body)
    };

    let resp = match outcome {
        Ok(sealed) => {
            if let Some(block) = &sealed {
                info!("POST /transactions/ - sealed block #{}", block.index);
            }
            SubmitResponse {
                success: true,
                error: None,
                new_block: sealed,
            }
        }
        Err(rejection) => SubmitResponse {
            success: false,
            error: Some(rejection.to_string()),
            new_block: None,
        },
    };

    debug!(
        "POST /transactions/ - success={} ({} ms)",
        resp.success,
        t0.elapsed().as_millis()
    );
    HttpResponse::Ok().json(resp)
}

/// Number of confirmed transfers.
#[get("/transactions/count/")]
pub async fn get_transaction_count(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(CountResponse {
        count: ledger.transaction_count(),
    })
}
