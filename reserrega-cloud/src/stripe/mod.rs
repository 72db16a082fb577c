//! Stripe webhook integration (no SDK dependency)
//!
//! Signature verification and the mapping from Stripe subscription objects
//! to the stored subscription row.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared::billing::{PlanType, SubscriptionStatus};

/// Maximum clock skew accepted for a signed webhook
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Invalid Stripe-Signature header")]
    MalformedHeader,
    #[error("Invalid signature hex")]
    InvalidHex,
    #[error("Webhook signature mismatch")]
    SignatureMismatch,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("HMAC key error")]
    Key,
}

/// Verify a Stripe webhook signature (HMAC-SHA256 over `"{t}.{payload}"`)
///
/// Any `v1=` entry may match; Stripe sends several while a secret rotates.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now_secs: i64,
) -> Result<(), WebhookError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::Key)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let mut matched = false;
    for signature in signatures {
        let sig_bytes = hex::decode(signature).map_err(|_| WebhookError::InvalidHex)?;
        // verify_slice consumes the mac, so compare on a clone
        if mac.clone().verify_slice(&sig_bytes).is_ok() {
            matched = true;
            break;
        }
    }
    if !matched {
        return Err(WebhookError::SignatureMismatch);
    }

    let ts: i64 = timestamp.parse().map_err(|_| WebhookError::InvalidTimestamp)?;
    if (now_secs - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::TimestampOutOfTolerance);
    }

    Ok(())
}

/// Build a `Stripe-Signature` header value for `payload`
///
/// Used by the integration tests and local tooling to produce signed events.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::Key)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={signature}"))
}

/// Map a Stripe subscription status onto the stored status
pub fn map_provider_status(status: &str) -> Option<SubscriptionStatus> {
    match status {
        "active" => Some(SubscriptionStatus::Active),
        "trialing" => Some(SubscriptionStatus::Trialing),
        "past_due" | "unpaid" | "incomplete" => Some(SubscriptionStatus::PastDue),
        "canceled" | "incomplete_expired" => Some(SubscriptionStatus::Canceled),
        "paused" => Some(SubscriptionStatus::Inactive),
        _ => None,
    }
}

/// Price ids configured for the paid plans
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    pub pro_price_id: String,
    pub enterprise_price_id: String,
}

impl PriceCatalog {
    pub fn plan_for_price(&self, price_id: &str) -> Option<PlanType> {
        if price_id == self.pro_price_id {
            Some(PlanType::Pro)
        } else if price_id == self.enterprise_price_id {
            Some(PlanType::Enterprise)
        } else {
            None
        }
    }

    /// Plan of a Stripe subscription object: `metadata.plan` first, then the
    /// price of the first item.
    pub fn plan_of(&self, obj: &serde_json::Value) -> Option<PlanType> {
        if let Some(plan) = obj
            .get("metadata")
            .and_then(|m| m["plan"].as_str())
            .and_then(PlanType::from_db)
        {
            return Some(plan);
        }
        obj.get("items")
            .and_then(|i| i.get("data"))
            .and_then(|d| d.as_array())
            .and_then(|a| a.first())
            .and_then(|item| item.get("price"))
            .and_then(|p| p["id"].as_str())
            .and_then(|id| self.plan_for_price(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_signature_roundtrip() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign_payload(payload, SECRET, 1_700_000_000).unwrap();
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 1_700_000_100),
            Ok(())
        );
    }

    #[test]
    fn test_signature_rejects_tampered_payload() {
        let header = sign_payload(b"{}", SECRET, 1_700_000_000).unwrap();
        assert_eq!(
            verify_webhook_signature(b"{ }", &header, SECRET, 1_700_000_000),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_signature_rejects_stale_timestamp() {
        let header = sign_payload(b"{}", SECRET, 1_700_000_000).unwrap();
        assert_eq!(
            verify_webhook_signature(b"{}", &header, SECRET, 1_700_000_301),
            Err(WebhookError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_signature_accepts_any_v1_entry() {
        let good = sign_payload(b"{}", SECRET, 10).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=10,v1={},v1={good_sig}", "00".repeat(32));
        assert_eq!(verify_webhook_signature(b"{}", &header, SECRET, 10), Ok(()));
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_webhook_signature(b"{}", "v1=abcd", SECRET, 0),
            Err(WebhookError::MalformedHeader)
        );
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(map_provider_status("unpaid"), Some(SubscriptionStatus::PastDue));
        assert_eq!(map_provider_status("incomplete"), Some(SubscriptionStatus::PastDue));
        assert_eq!(
            map_provider_status("incomplete_expired"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(map_provider_status("paused"), Some(SubscriptionStatus::Inactive));
        assert_eq!(map_provider_status("bogus"), None);
    }

    #[test]
    fn test_plan_from_metadata_then_price() {
        let catalog = PriceCatalog {
            pro_price_id: "price_pro".into(),
            enterprise_price_id: "price_ent".into(),
        };
        let by_meta = serde_json::json!({"metadata": {"plan": "enterprise"}});
        assert_eq!(catalog.plan_of(&by_meta), Some(PlanType::Enterprise));

        let by_price = serde_json::json!({
            "metadata": {},
            "items": {"data": [{"price": {"id": "price_pro"}}]}
        });
        assert_eq!(catalog.plan_of(&by_price), Some(PlanType::Pro));

        assert_eq!(catalog.plan_of(&serde_json::json!({})), None);
    }
}
