use crate::error::GatewayError;
use crate::models::payment::{EstimateQuery, NewPayment, Payment};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the top-up flow needs from the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, GatewayError>;

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError>;

    async fn currencies(&self) -> Result<Vec<String>, GatewayError>;

    async fn estimate(&self, amount: &str, currency_from: &str, currency_to: &str) -> Result<serde_json::Value, GatewayError>;
}

/// REST client for the NOWPayments API. One request per call, no retries.
pub struct NowPaymentsClient {
    http: Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct CurrenciesBody {
    #[serde(default)]
    currencies: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl NowPaymentsClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(NowPaymentsClient {
            http,
            base_url,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends each segment percent-encoded, so ids cannot add path levels or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.header("x-api-key", &self.api_key).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!("Processor error body: {}", body);
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|err| err.message);
            return Err(GatewayError::Rejected { status: status.as_u16(), message });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentGateway for NowPaymentsClient {
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, GatewayError> {
        self.send(self.http.post(self.endpoint(&["payment"])?).json(payment)).await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        self.send(self.http.get(self.endpoint(&["payment", payment_id])?)).await
    }

    async fn currencies(&self) -> Result<Vec<String>, GatewayError> {
        let body: CurrenciesBody = self.send(self.http.get(self.endpoint(&["currencies"])?)).await?;
        Ok(body.currencies)
    }

    async fn estimate(&self, amount: &str, currency_from: &str, currency_to: &str) -> Result<serde_json::Value, GatewayError> {
        let query = [("amount", amount), ("currency_from", currency_from), ("currency_to", currency_to)];
        self.send(self.http.get(self.endpoint(&["estimate"])?).query(&query)).await
    }
}

/// Resolved estimate parameters, with the processor's defaults filled in.
pub fn estimate_currencies(query: &EstimateQuery) -> (&str, &str) {
    (
        query.currency_from.as_deref().unwrap_or("usd"),
        query.currency_to.as_deref().unwrap_or("btc"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = NowPaymentsClient::new("https://api.nowpayments.io/v1/", "key").unwrap();
        assert_eq!(client.endpoint(&["payment"]).unwrap().as_str(), "https://api.nowpayments.io/v1/payment");

        let client = NowPaymentsClient::new("https://api.nowpayments.io/v1", "key").unwrap();
        assert_eq!(client.endpoint(&["payment"]).unwrap().as_str(), "https://api.nowpayments.io/v1/payment");
    }

    #[test]
    fn payment_id_stays_one_path_segment() {
        let client = NowPaymentsClient::new("https://api.nowpayments.io/v1", "key").unwrap();

        let url = client.endpoint(&["payment", "123?limit=500"]).unwrap();
        assert_eq!(url.as_str(), "https://api.nowpayments.io/v1/payment/123%3Flimit=500");
        assert_eq!(url.query(), None);

        let url = client.endpoint(&["payment", "x/../currencies"]).unwrap();
        assert_eq!(url.as_str(), "https://api.nowpayments.io/v1/payment/x%2F..%2Fcurrencies");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        assert!(matches!(NowPaymentsClient::new("not a url", "key"), Err(GatewayError::InvalidUrl(_))));
    }

    #[test]
    fn default_client_waits_ten_seconds() {
        let client = NowPaymentsClient::new("https://api.nowpayments.io/v1", "key").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stalled_processor_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without answering.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = NowPaymentsClient::with_timeout(&format!("http://{}/v1", addr), "key", Duration::from_millis(200)).unwrap();
        let err = client.currencies().await.unwrap_err();
        match err {
            GatewayError::Transport(e) => assert!(e.is_timeout(), "expected a timeout, got {}", e),
            other => panic!("expected a transport error, got {}", other),
        }
    }

    #[test]
    fn estimate_defaults_to_usd_btc() {
        let query = EstimateQuery { amount: Some("10".into()), ..EstimateQuery::default() };
        assert_eq!(estimate_currencies(&query), ("usd", "btc"));
    }
}
