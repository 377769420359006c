#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use crypto_topup::app_state::AppState;
use crypto_topup::config::Config;
use crypto_topup::error::GatewayError;
use crypto_topup::models::account::Account;
use crypto_topup::models::payment::{NewPayment, Payment};
use crypto_topup::services::memory_store::InMemoryAccountStore;
use crypto_topup::services::nowpayments::PaymentGateway;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const IPN_SECRET: &str = "test-ipn-secret";
pub const APP_URL: &str = "https://topup.example.com";

/// Gateway double that records calls and answers with canned data.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub created: Mutex<Vec<NewPayment>>,
    pub reject_with: Option<String>,
}

impl FakeGateway {
    pub fn rejecting(message: &str) -> Self {
        FakeGateway { reject_with: Some(message.to_string()), ..FakeGateway::default() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reject_with {
            Some(message) => Err(GatewayError::Rejected { status: 400, message: Some(message.clone()) }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, GatewayError> {
        self.record()?;
        self.created.lock().unwrap().push(payment.clone());
        Ok(Payment {
            payment_id: Some("5745459419".to_string()),
            payment_status: Some("waiting".to_string()),
            pay_address: Some("bc1qexampleaddress".to_string()),
            pay_amount: Some(dec("0.00041")),
            pay_currency: Some(payment.pay_currency.clone()),
            price_amount: Some(payment.price_amount.clone()),
            price_currency: Some(payment.price_currency.clone()),
            actually_paid: None,
            order_id: Some(payment.order_id.clone()),
        })
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        self.record()?;
        Ok(Payment {
            payment_id: Some(payment_id.to_string()),
            payment_status: Some("finished".to_string()),
            actually_paid: Some(dec("0.00041")),
            ..Payment::default()
        })
    }

    async fn currencies(&self) -> Result<Vec<String>, GatewayError> {
        self.record()?;
        Ok(vec!["btc".to_string(), "eth".to_string(), "xmr".to_string()])
    }

    async fn estimate(&self, amount: &str, currency_from: &str, currency_to: &str) -> Result<serde_json::Value, GatewayError> {
        self.record()?;
        Ok(serde_json::json!({
            "currency_from": currency_from,
            "amount_from": amount,
            "currency_to": currency_to,
            "estimated_amount": "0.00041",
        }))
    }
}

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn config() -> Config {
    Config {
        nowpayments_api_key: Some("test-key".to_string()),
        nowpayments_ipn_secret: Some(IPN_SECRET.to_string()),
        app_url: APP_URL.to_string(),
        ..Config::default()
    }
}

pub struct Harness {
    pub state: web::Data<AppState>,
    pub store: InMemoryAccountStore,
    pub gateway: Arc<FakeGateway>,
}

pub fn harness_with(config: Config, gateway: FakeGateway, with_gateway: bool) -> Harness {
    let store = InMemoryAccountStore::new();
    let gateway = Arc::new(gateway);
    let state = AppState::new(
        config,
        Arc::new(store.clone()),
        if with_gateway { Some(gateway.clone() as Arc<dyn PaymentGateway>) } else { None },
    );
    Harness { state: web::Data::new(state), store, gateway }
}

pub fn harness() -> Harness {
    harness_with(config(), FakeGateway::default(), true)
}

/// State as it looks when no processor API key is configured.
pub fn harness_without_key() -> Harness {
    let config = Config { nowpayments_api_key: None, ..config() };
    harness_with(config, FakeGateway::default(), false)
}

pub async fn seed_account(store: &InMemoryAccountStore, usd_balance: &str) -> Uuid {
    let id = Uuid::new_v4();
    let mut account = Account::new(id);
    account.usd_balance = dec(usd_balance);
    store.insert(account).await;
    id
}
