use actix_web::{HttpResponse, Responder, get, post, web};
use log::error;

use super::models::{
    AddressesResponse, AppState, ErrorResponse, NewAddressResponse, WalletResponse,
};

/// Confirmed balance and owned assets of an address.
#[get("/wallet/{address}/")]
pub async fn get_wallet(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
) -> impl Responder {
    let address = path.into_inner().0;

    let view = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.wallet_of(&address)
    };

    match view {
        Ok(Some(view)) => HttpResponse::Ok().json(WalletResponse {
            address,
            balance: view.balance,
            assets: view.assets,
        }),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            error: format!("unknown address {address}"),
        }),
        Err(e) => {
            error!("GET /wallet/{address}/ - {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

/// Every known address except the mint.
#[get("/addresses/")]
pub async fn list_addresses(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(AddressesResponse {
        addresses: ledger.list_addresses(),
    })
}

/// Mint a fresh address funded with the signup grant.
#[post("/addresses/")]
pub async fn create_address(state: web::Data<AppState>) -> impl Responder {
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.register_address(state.signup_grant) {
        Ok((address, new_block)) => {
            HttpResponse::Ok().json(NewAddressResponse { address, new_block })
        }
        Err(rejection) => HttpResponse::BadRequest().json(ErrorResponse {
            error: rejection.to_string(),
        }),
    }
}
