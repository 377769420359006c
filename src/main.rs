use actix_web::{App, HttpServer, web};
use actix_cors::Cors;
use crypto_topup::app_state::AppState;
use crypto_topup::config::Config;
use crypto_topup::db;
use crypto_topup::routes;
use crypto_topup::services::account_service::{AccountStore, PgAccountStore};
use crypto_topup::services::memory_store::InMemoryAccountStore;
use crypto_topup::services::nowpayments::{NowPaymentsClient, PaymentGateway};
use dotenv::dotenv;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let accounts: Arc<dyn AccountStore> = match &config.database_url {
        Some(url) => Arc::new(PgAccountStore::new(db::pool::create_pool(url).await?)),
        None => {
            log::warn!("DATABASE_URL is not set, accounts are kept in memory");
            Arc::new(InMemoryAccountStore::new())
        }
    };

    let gateway: Option<Arc<dyn PaymentGateway>> = match &config.nowpayments_api_key {
        Some(key) => Some(Arc::new(NowPaymentsClient::new(&config.nowpayments_api_url, key)?)),
        None => {
            log::warn!("NOWPAYMENTS_API_KEY is not set, payment routes will answer 500");
            None
        }
    };

    if config.nowpayments_ipn_secret.is_none() {
        log::warn!("NOWPAYMENTS_IPN_SECRET is not set, IPN callbacks will be rejected");
    }

    let bind_addr = (config.host.clone(), config.port);
    let app_state = web::Data::new(AppState::new(config, accounts, gateway));

    log::info!("Server is running on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone()) // Pass the application state
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
