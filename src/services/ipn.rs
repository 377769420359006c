use crate::error::ApiError;
use crate::models::account::{Account, Credit, CreditOutcome};
use crate::models::payment::IpnNotification;
use crate::models::types::{is_settled, AccountId};
use crate::services::account_service::AccountStore;
use hmac::{Hmac, Mac};
use serde_json::{Number, Value};
use sha2::Sha512;
use std::str::FromStr;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-nowpayments-sig";

#[derive(Debug, PartialEq)]
pub enum IpnOutcome {
    /// Status does not settle the payment; nothing changed.
    Ignored,
    Credited(Account),
    AlreadyProcessed,
}

/// Checks the processor's HMAC-SHA512 signature over `body`.
///
/// The processor signs `JSON.stringify` of the notification with object keys
/// sorted, so the body is rebuilt in that form before hashing.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> Result<Value, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid IPN signature".to_string());

    let signature = signature.ok_or_else(invalid)?;
    let expected = hex::decode(signature.trim()).map_err(|_| invalid())?;

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed IPN body: {}", e)))?;

    let mut mac = keyed_mac(secret)?;
    mac.update(canonical_json(&value).as_bytes());
    mac.verify_slice(&expected).map_err(|_| invalid())?;

    Ok(value)
}

/// Hex signature the processor would send for `body`.
pub fn sign(secret: &str, body: &Value) -> Result<String, ApiError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(canonical_json(body).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn keyed_mac(secret: &str) -> Result<HmacSha512, ApiError> {
    HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::NotConfigured("IPN secret is not usable".to_string()))
}

/// Compact JSON with keys sorted at every level and numbers printed as JavaScript prints them.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(number) => out.push_str(&js_number(number)),
        other => out.push_str(&other.to_string()),
    }
}

fn js_number(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(int) = number.as_u64() {
        return int.to_string();
    }
    match number.as_f64() {
        Some(float) => js_float(float),
        None => number.to_string(),
    }
}

// Number::prototype.toString: plain notation for 1e-6 <= |x| < 1e21, exponent otherwise.
fn js_float(float: f64) -> String {
    if float == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.2e-6".
    let scientific = format!("{:e}", float.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1; // position of the decimal point relative to the digits

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let fraction = if k > 1 { format!(".{}", &digits[1..]) } else { String::new() };
        let sign = if n - 1 >= 0 { "+" } else { "-" };
        format!("{}{}e{}{}", &digits[..1], fraction, sign, (n - 1).abs())
    };

    if float.is_sign_negative() {
        format!("-{}", body)
    } else {
        body
    }
}

/// Account id encoded as the prefix of `<accountId>_<timestamp>`.
pub fn account_id_from_order(order_id: &str) -> Option<AccountId> {
    let prefix = order_id.split('_').next()?;
    AccountId::from_str(prefix).ok()
}

/// Applies a verified notification to the account it belongs to.
pub async fn settle(store: &dyn AccountStore, ipn: &IpnNotification) -> Result<IpnOutcome, ApiError> {
    if !is_settled(&ipn.payment_status) {
        log::info!("IPN with status '{}' acknowledged without changes", ipn.payment_status);
        return Ok(IpnOutcome::Ignored);
    }

    let order_id = ipn
        .order_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("IPN is missing order_id".to_string()))?;
    let account_id = account_id_from_order(order_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unrecognised order_id: {}", order_id)))?;
    let payment_id = ipn
        .payment_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("IPN is missing payment_id".to_string()))?;
    let usd_amount = ipn
        .price_amount
        .clone()
        .ok_or_else(|| ApiError::BadRequest("IPN is missing price_amount".to_string()))?;
    let crypto_amount = ipn
        .crypto_amount()
        .ok_or_else(|| ApiError::BadRequest("IPN is missing the paid amount".to_string()))?;

    let credit = Credit { payment_id, crypto_amount, usd_amount };
    let outcome = store
        .credit_payment(&account_id, &credit)
        .await
        .map_err(|e| ApiError::store(e, "Error processing IPN"))?;

    match outcome {
        CreditOutcome::Credited(account) => {
            log::info!(
                "Updated balance for account {}: +${} (+{} crypto), payment {}",
                account_id, credit.usd_amount, credit.crypto_amount, credit.payment_id
            );
            Ok(IpnOutcome::Credited(account))
        }
        CreditOutcome::AlreadyProcessed => {
            log::info!("Payment already processed: {}", credit.payment_id);
            Ok(IpnOutcome::AlreadyProcessed)
        }
        CreditOutcome::AccountNotFound => {
            log::error!("User not found for IPN: {}", account_id);
            Err(ApiError::NotFound("User not found".to_string()))
        }
    }
}
