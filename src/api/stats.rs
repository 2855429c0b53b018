use actix_web::{HttpResponse, Responder, get, web};

use super::models::AppState;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let stats = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.stats()
    };
    HttpResponse::Ok().json(stats)
}
