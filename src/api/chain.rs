use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{AppState, BlocksQuery, ErrorResponse, SuccessResponse, ValidateResponse};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Reload the ledger from the newest durable snapshot.
#[post("/chain/reload/")]
pub async fn reload_chain(state: web::Data<AppState>) -> impl Responder {
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let success = ledger.reload();
    info!("POST /chain/reload/ - success={success}, height={}", ledger.len());
    HttpResponse::Ok().json(SuccessResponse { success })
}

/// Write a new snapshot of the current chain.
#[post("/chain/save/")]
pub async fn save_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(SuccessResponse {
        success: ledger.persist(),
    })
}

/// Validate the whole chain.
#[get("/chain/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: ledger.is_valid_chain(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
    })
}

/// Seal whatever is pending into a new block.
#[post("/blocks/seal/")]
pub async fn seal_block(state: web::Data<AppState>) -> impl Responder {
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ledger.force_seal())
}

/// Page through confirmed blocks.
#[get("/blocks/")]
pub async fn get_blocks(
    state: web::Data<AppState>,
    query: web::Query<BlocksQuery>,
) -> impl Responder {
    let start = query.start.unwrap_or(0);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);

    let ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.page(start, size) {
        Some(page) => HttpResponse::Ok().json(page),
        None => HttpResponse::BadRequest().json(ErrorResponse {
            error: format!(
                "invalid page: start={start}, size={size}, height={}",
                ledger.len()
            ),
        }),
    }
}
