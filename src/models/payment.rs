use serde::{Serialize, Deserialize, Serializer};
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use crate::models::account::AccountBalance;
use crate::models::types::{id_from_string_or_number, PaymentId};

pub const DEFAULT_PRICE_CURRENCY: &str = "USD";
pub const DEFAULT_PAY_CURRENCY: &str = "btc";

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub user_id: Option<String>,
    pub price_amount: Option<BigDecimal>,
    pub price_currency: Option<String>,
    pub pay_currency: Option<String>,
    pub order_description: Option<String>,
}

/// Body of `POST {api}/payment`.
#[derive(Serialize, Debug, Clone)]
pub struct NewPayment {
    #[serde(serialize_with = "decimal_as_number")]
    pub price_amount: BigDecimal,
    pub price_currency: String,
    pub pay_currency: String,
    pub order_id: String,
    pub order_description: String,
    pub ipn_callback_url: String,
}

/// A payment as reported by the processor.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Payment {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub payment_id: Option<PaymentId>,
    pub payment_status: Option<String>,
    pub pay_address: Option<String>,
    pub pay_amount: Option<BigDecimal>,
    pub pay_currency: Option<String>,
    pub price_amount: Option<BigDecimal>,
    pub price_currency: Option<String>,
    pub actually_paid: Option<BigDecimal>,
    pub order_id: Option<String>,
}

/// Fields returned to the client after creating a payment.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatedPayment {
    pub payment_id: Option<PaymentId>,
    pub pay_address: Option<String>,
    pub pay_amount: Option<BigDecimal>,
    pub pay_currency: Option<String>,
    pub price_amount: Option<BigDecimal>,
    pub price_currency: Option<String>,
    pub payment_status: Option<String>,
    pub order_id: Option<String>,
}

impl From<Payment> for CreatedPayment {
    fn from(payment: Payment) -> Self {
        CreatedPayment {
            payment_id: payment.payment_id,
            pay_address: payment.pay_address,
            pay_amount: payment.pay_amount,
            pay_currency: payment.pay_currency,
            price_amount: payment.price_amount,
            price_currency: payment.price_currency,
            payment_status: payment.payment_status,
            order_id: payment.order_id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub payment: CreatedPayment,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub payment: Payment,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CurrenciesResponse {
    pub success: bool,
    pub currencies: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct EstimateResponse {
    pub success: bool,
    pub estimate: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub success: bool,
    pub account: AccountBalance,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct EstimateQuery {
    pub amount: Option<String>,
    pub currency_from: Option<String>,
    pub currency_to: Option<String>,
}

/// Settlement notification posted by the processor.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IpnNotification {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub payment_status: String,
    pub order_id: Option<String>,
    pub price_amount: Option<BigDecimal>,
    pub actually_paid: Option<BigDecimal>,
    pub pay_amount: Option<BigDecimal>,
}

impl IpnNotification {
    /// Crypto amount to credit: `actually_paid`, or the quoted `pay_amount` when nothing was reported.
    pub fn crypto_amount(&self) -> Option<BigDecimal> {
        match &self.actually_paid {
            Some(paid) if !paid.is_zero() => Some(paid.clone()),
            _ => self.pay_amount.clone(),
        }
    }
}

fn decimal_as_number<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.to_f64().filter(|number| number.is_finite()) {
        Some(number) => serializer.serialize_f64(number),
        None => Err(serde::ser::Error::custom(format!("{} is not representable as a number", value))),
    }
}
