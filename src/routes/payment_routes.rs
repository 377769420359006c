use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use std::str::FromStr;
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::payment::{
    AckResponse, CreatePaymentRequest, CreatePaymentResponse, CurrenciesResponse, EstimateQuery,
    EstimateResponse, IpnNotification, NewPayment, PaymentStatusResponse, DEFAULT_PAY_CURRENCY,
    DEFAULT_PRICE_CURRENCY,
};
use crate::models::types::AccountId;
use crate::services::ipn::{self, IpnOutcome, SIGNATURE_HEADER};
use crate::services::nowpayments::estimate_currencies;

// Route to open a processor payment for a top-up
pub async fn create_payment(
    request: web::Json<CreatePaymentRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();

    let (user_id, price_amount) = match (non_blank(request.user_id), request.price_amount) {
        (Some(user_id), Some(amount)) if amount > BigDecimal::zero() => (user_id, amount),
        _ => {
            return Err(ApiError::BadRequest(
                "Missing required fields: userId and priceAmount".to_string(),
            ))
        }
    };

    // The processor takes the price as a JSON number.
    if !price_amount.to_f64().map_or(false, f64::is_finite) {
        return Err(ApiError::BadRequest(format!("priceAmount is out of range: {}", price_amount)));
    }

    let account_id = AccountId::from_str(&user_id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid userId: {}", user_id)))?;

    let gateway = app_state.gateway()?;

    let account = app_state
        .accounts
        .get_account(&account_id)
        .await
        .map_err(|e| ApiError::store(e, "Error creating payment"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let new_payment = NewPayment {
        price_amount,
        price_currency: non_blank(request.price_currency).unwrap_or_else(|| DEFAULT_PRICE_CURRENCY.to_string()),
        pay_currency: non_blank(request.pay_currency).unwrap_or_else(|| DEFAULT_PAY_CURRENCY.to_string()),
        order_id: format!("{}_{}", account.id, chrono::Utc::now().timestamp_millis()),
        order_description: non_blank(request.order_description)
            .unwrap_or_else(|| format!("Top-up for account {}", account.id)),
        ipn_callback_url: app_state.config.ipn_callback_url(),
    };

    log::info!("Creating payment {} for {} {}", new_payment.order_id, new_payment.price_amount, new_payment.price_currency);

    let payment = gateway
        .create_payment(&new_payment)
        .await
        .map_err(|e| ApiError::upstream(e, "Error creating payment"))?;

    Ok(HttpResponse::Ok().json(CreatePaymentResponse {
        success: true,
        payment: payment.into(),
    }))
}

pub async fn get_payment_status(
    payment_id: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let payment_id = payment_id.into_inner();
    if !is_valid_payment_id(&payment_id) {
        return Err(ApiError::BadRequest(format!("Invalid payment id: {}", payment_id)));
    }
    let gateway = app_state.gateway()?;

    let payment = gateway
        .get_payment(&payment_id)
        .await
        .map_err(|e| ApiError::upstream(e, "Error fetching payment status"))?;

    Ok(HttpResponse::Ok().json(PaymentStatusResponse { success: true, payment }))
}

/// Settlement callback from the processor. A failure status makes the processor retry.
pub async fn ipn(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let secret = app_state.ipn_secret()?;
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let payload = ipn::verify_signature(secret, &body, signature)?;
    log::info!("Received IPN: {}", payload);

    let notification: IpnNotification = serde_json::from_value(payload)
        .map_err(|e| ApiError::BadRequest(format!("Malformed IPN body: {}", e)))?;

    let message = match ipn::settle(app_state.accounts.as_ref(), &notification).await? {
        IpnOutcome::AlreadyProcessed => Some("Payment already processed".to_string()),
        IpnOutcome::Credited(_) | IpnOutcome::Ignored => None,
    };

    Ok(HttpResponse::Ok().json(AckResponse { success: true, message }))
}

pub async fn get_currencies(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let gateway = app_state.gateway()?;

    let currencies = gateway
        .currencies()
        .await
        .map_err(|e| ApiError::upstream(e, "Error fetching currencies"))?;

    Ok(HttpResponse::Ok().json(CurrenciesResponse { success: true, currencies }))
}

pub async fn get_estimate(
    query: web::Query<EstimateQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    // Configuration is checked first so a missing key always reports 500.
    let gateway = app_state.gateway()?;

    let amount = query
        .amount
        .as_deref()
        .filter(|amount| !amount.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Amount is required".to_string()))?;
    let (currency_from, currency_to) = estimate_currencies(&query);

    let estimate = gateway
        .estimate(amount, currency_from, currency_to)
        .await
        .map_err(|e| ApiError::upstream(e, "Error getting estimate"))?;

    Ok(HttpResponse::Ok().json(EstimateResponse { success: true, estimate }))
}

// Processor payment ids are plain alphanumerics.
fn is_valid_payment_id(payment_id: &str) -> bool {
    !payment_id.is_empty() && payment_id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
