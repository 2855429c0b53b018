use actix_web::{HttpResponse, Responder, get, post, web};

use super::models::{AppState, AssetsResponse, ErrorResponse, NewAssetRequest, NewAssetResponse};

#[get("/assets/")]
pub async fn list_assets(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(AssetsResponse {
        assets: ledger.list_assets(),
    })
}

/// Mint a new asset to `owner` and confirm it in its own block.
#[post("/assets/")]
pub async fn create_asset(
    state: web::Data<AppState>,
    body: web::Json<NewAssetRequest>,
) -> impl Responder {
    let owner = body.owner.trim().to_string();
    if owner.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "owner required".to_string(),
        });
    }

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.register_asset(&owner) {
        Ok((asset, new_block)) => HttpResponse::Ok().json(NewAssetResponse {
            asset,
            owner,
            new_block,
        }),
        Err(rejection) => HttpResponse::BadRequest().json(ErrorResponse {
            error: rejection.to_string(),
        }),
    }
}
