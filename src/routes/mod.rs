pub mod account_routes;
pub mod payment_routes;

use actix_web::web;
use crate::error::ApiError;

/// Registers every route; shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(4096)
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/nowpayments")
            .route("/create-payment", web::post().to(payment_routes::create_payment))
            .route("/payment-status/{payment_id}", web::get().to(payment_routes::get_payment_status))
            .route("/ipn", web::post().to(payment_routes::ipn))
            .route("/currencies", web::get().to(payment_routes::get_currencies))
            .route("/estimate", web::get().to(payment_routes::get_estimate)),
    )
    .route("/accounts/{id}", web::get().to(account_routes::get_account));
}
