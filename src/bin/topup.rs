//! Command-line top-up client.
//!
//! Creates a payment, shows where to send funds, and lets the user check on
//! it. Balances shown here always come from the server.

use anyhow::{anyhow, bail, Context};
use bigdecimal::{BigDecimal, Zero};
use clap::{Parser, Subcommand};
use crypto_topup::models::payment::{
    AccountResponse, CreatePaymentRequest, CreatePaymentResponse, CurrenciesResponse,
    PaymentStatusResponse, DEFAULT_PAY_CURRENCY, DEFAULT_PRICE_CURRENCY,
};
use crypto_topup::models::types::{is_settled, AccountId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const POPULAR_CURRENCIES: [&str; 7] = ["btc", "eth", "usdt", "ltc", "doge", "bnb", "trx"];
const CLEAR_DELAY: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(name = "topup", about = "Top up an account balance with crypto")]
struct Cli {
    /// Base URL of the top-up server
    #[arg(long, env = "TOPUP_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Where the pending payment is remembered between runs
    #[arg(long, default_value = ".topup-session.json")]
    session: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the currencies payments can be made in
    Currencies,
    /// Open a payment for a USD amount
    Create {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        amount: BigDecimal,
        #[arg(long, default_value = DEFAULT_PAY_CURRENCY)]
        currency: String,
    },
    /// Check a payment; defaults to the pending one
    Status { payment_id: Option<String> },
}

/// Pending payment kept on disk until it settles.
#[derive(Serialize, Deserialize, Debug)]
struct Session {
    account_id: AccountId,
    payment_id: String,
}

#[derive(Deserialize)]
struct Failure {
    message: Option<String>,
}

struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(ApiClient { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    async fn read<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> anyhow::Result<T> {
        let response = request.send().await.context("server is unreachable")?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Failure>(&body)
                .ok()
                .and_then(|failure| failure.message)
                .unwrap_or_else(|| format!("server answered {}", status));
            bail!(message);
        }
        serde_json::from_str(&body).with_context(|| format!("unexpected response: {}", body))
    }

    async fn currencies(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/nowpayments/currencies", self.base_url);
        let response: CurrenciesResponse = self.read(self.http.get(url)).await?;
        Ok(response.currencies)
    }

    async fn create(&self, request: &CreatePaymentRequest) -> anyhow::Result<CreatePaymentResponse> {
        let url = format!("{}/nowpayments/create-payment", self.base_url);
        self.read(self.http.post(url).json(request)).await
    }

    async fn status(&self, payment_id: &str) -> anyhow::Result<PaymentStatusResponse> {
        let url = format!("{}/nowpayments/payment-status/{}", self.base_url, payment_id);
        self.read(self.http.get(url)).await
    }

    async fn account(&self, id: &AccountId) -> anyhow::Result<AccountResponse> {
        let url = format!("{}/accounts/{}", self.base_url, id);
        self.read(self.http.get(url)).await
    }
}

fn popular(currencies: Vec<String>) -> Vec<String> {
    let filtered: Vec<String> = currencies
        .iter()
        .filter(|c| POPULAR_CURRENCIES.contains(&c.to_lowercase().as_str()))
        .cloned()
        .collect();
    if filtered.is_empty() {
        currencies.into_iter().take(10).collect()
    } else {
        filtered
    }
}

fn load_session(path: &Path) -> anyhow::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

fn save_session(path: &Path, session: &Session) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api_url)?;

    match cli.command {
        Command::Currencies => {
            for currency in popular(client.currencies().await?) {
                println!("{}", currency);
            }
        }
        Command::Create { account, amount, currency } => {
            if amount <= BigDecimal::zero() {
                bail!("Please enter a valid amount");
            }
            let request = CreatePaymentRequest {
                user_id: Some(account.to_string()),
                price_amount: Some(amount),
                price_currency: Some(DEFAULT_PRICE_CURRENCY.to_string()),
                pay_currency: Some(currency),
                order_description: None,
            };
            let payment = client.create(&request).await?.payment;
            let payment_id = payment.payment_id.clone().ok_or_else(|| anyhow!("server returned no payment id"))?;

            println!(
                "Payment created! Send {} {} to the address below.",
                payment.pay_amount.map(|a| a.to_string()).unwrap_or_default(),
                payment.pay_currency.unwrap_or_default().to_uppercase()
            );
            println!("{}", payment.pay_address.unwrap_or_default());
            println!("Payment id: {}", payment_id);

            save_session(&cli.session, &Session { account_id: account, payment_id })?;
        }
        Command::Status { payment_id } => {
            let session = load_session(&cli.session)?;
            let payment_id = match (payment_id, &session) {
                (Some(id), _) => id,
                (None, Some(session)) => session.payment_id.clone(),
                (None, None) => bail!("No pending payment, pass a payment id"),
            };

            let payment = client.status(&payment_id).await?.payment;
            let status = payment.payment_status.unwrap_or_default();

            if !is_settled(&status) {
                println!("Payment status: {}. Please wait...", status);
                return Ok(());
            }

            println!(
                "Payment confirmed! ${} has been added to your balance.",
                payment.price_amount.map(|a| a.to_string()).unwrap_or_default()
            );

            if let Some(session) = session.filter(|s| s.payment_id == payment_id) {
                let account = client.account(&session.account_id).await?.account;
                println!("Current balance: ${} ({} crypto)", account.usd_balance.with_scale(2), account.balance);

                tokio::time::sleep(CLEAR_DELAY).await;
                std::fs::remove_file(&cli.session)?;
            }
        }
    }

    Ok(())
}
