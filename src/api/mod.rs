mod assets;
mod chain;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(stats::get_stats)
            .service(chain::reload_chain)
            .service(chain::save_chain)
            .service(chain::validate_chain)
            .service(chain::seal_block)
            .service(chain::get_blocks)
            .service(tx::post_transaction)
            .service(tx::get_transaction_count)
            .service(wallet::get_wallet)
            .service(wallet::list_addresses)
            .service(wallet::create_address)
            .service(assets::list_assets)
            .service(assets::create_asset),
    );
}
