mod api;
mod blockchain;
mod config;
mod error;
mod storage;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use blockchain::Blockchain;
use config::LedgerConfig;
use storage::SnapshotStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = LedgerConfig::from_env();
    let ledger = Blockchain::open(config.chain, SnapshotStore::new(&config.storage_dir));
    info!(
        "ledger ready: height={}, difficulty={}, storage={}",
        ledger.len(),
        ledger.difficulty(),
        config.storage_dir.display()
    );

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(AppState::new(ledger, config.signup_grant));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
