use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub type AccountId = Uuid; // primary key of the accounts table
pub type PaymentId = String; // processor payment id, kept verbatim

/// Payment statuses that settle a top-up.
pub const SETTLED_STATUSES: [&str; 2] = ["finished", "confirmed"];

pub fn is_settled(status: &str) -> bool {
    SETTLED_STATUSES.contains(&status)
}

/// The processor sends ids as JSON numbers in some payloads and strings in others.
pub fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<PaymentId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "id_from_string_or_number")]
        id: Option<PaymentId>,
    }

    #[test]
    fn numeric_and_textual_ids_agree() {
        let numeric: Wrapper = serde_json::from_str(r#"{"id": 5524759814}"#).unwrap();
        let textual: Wrapper = serde_json::from_str(r#"{"id": "5524759814"}"#).unwrap();
        assert_eq!(numeric.id, textual.id);
    }

    #[test]
    fn missing_id_is_none() {
        let empty: Wrapper = serde_json::from_str("{}").unwrap();
        assert!(empty.id.is_none());
    }

    #[test]
    fn only_finished_and_confirmed_settle() {
        assert!(is_settled("finished"));
        assert!(is_settled("confirmed"));
        for status in ["waiting", "confirming", "sending", "partially_paid", "failed", "expired"] {
            assert!(!is_settled(status), "{} must not settle", status);
        }
    }
}
