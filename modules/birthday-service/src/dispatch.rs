//! Greeting dispatch through the gateway.

use crate::gateway::Gateway;
use birthday_types::{BirthdayRecord, DispatchOutcome};
use futures_util::future::join_all;
use std::sync::Arc;

/// WhatsApp individual-chat domain suffix.
const CHAT_DOMAIN: &str = "@c.us";

/// Country-code prefix prepended to every dispatch address.
const COUNTRY_PREFIX: &str = "234";

/// Build the recipient address: `"234"` + last 10 characters of the phone +
/// the individual-chat domain. Shorter (or absent) phones keep whatever the
/// truncation yields; there is no special handling.
pub fn dispatch_address(phone: Option<&str>) -> String {
    let digits = phone.unwrap_or("");
    let skip = digits.chars().count().saturating_sub(10);
    let tail: String = digits.chars().skip(skip).collect();
    format!("{}{}{}", COUNTRY_PREFIX, tail, CHAT_DOMAIN)
}

pub fn greeting(name: Option<&str>) -> String {
    format!(
        "🎉 Happy Birthday {}! I wish you long life and prosperity. \
         May God bless you and may He grant you success in all you do. \
         Remain blessed",
        name.unwrap_or("")
    )
}

/// One send attempt for one entry. Success and failure are both logged; a
/// failure is returned as an outcome, never retried here.
pub async fn dispatch_one(gateway: &dyn Gateway, record: &BirthdayRecord) -> DispatchOutcome {
    let address = dispatch_address(record.phone.as_deref());
    let text = greeting(record.name.as_deref());
    let name = record.name.clone().unwrap_or_default();

    match gateway.send_message(&address, &text).await {
        Ok(()) => {
            log::info!("[BIRTHDAY_BOT] Sent greeting to {}", name);
            DispatchOutcome::sent(record.id, name)
        }
        Err(e) => {
            log::error!("[BIRTHDAY_BOT] Failed to greet {}: {}", name, e);
            DispatchOutcome::failed(record.id, name, e)
        }
    }
}

/// Issue all sends concurrently and collect every outcome. No ordering
/// guarantee, no rate limit; one failure never aborts the rest.
pub async fn dispatch_all(
    gateway: Arc<dyn Gateway>,
    matches: &[BirthdayRecord],
) -> Vec<DispatchOutcome> {
    let sends = matches
        .iter()
        .map(|record| {
            let gateway = gateway.clone();
            async move { dispatch_one(gateway.as_ref(), record).await }
        })
        .collect::<Vec<_>>();

    join_all(sends).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every send; addresses listed in `fail` are rejected.
    pub(crate) struct MockGateway {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: Vec<String>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: Vec::new(),
            }
        }

        pub fn failing_on(address: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: vec![address.to_string()],
            }
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        async fn send_message(&self, address: &str, body: &str) -> Result<(), String> {
            if self.fail.iter().any(|a| a == address) {
                return Err("delivery refused".to_string());
            }
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn record(id: i64, name: &str, phone: &str) -> BirthdayRecord {
        BirthdayRecord {
            id,
            name: Some(name.to_string()),
            phone: Some(phone.to_string()),
            birthday: Some("05-03".to_string()),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_dispatch_address_keeps_last_ten_digits() {
        assert_eq!(
            dispatch_address(Some("08012345678")),
            "2348012345678@c.us"
        );
        // Already 10 digits: kept whole
        assert_eq!(dispatch_address(Some("8012345678")), "2348012345678@c.us");
    }

    #[test]
    fn test_dispatch_address_short_or_missing_phone() {
        assert_eq!(dispatch_address(Some("12345")), "23412345@c.us");
        assert_eq!(dispatch_address(None), "234@c.us");
    }

    #[test]
    fn test_greeting_embeds_name() {
        let text = greeting(Some("Ada"));
        assert!(text.contains("Happy Birthday Ada!"));
    }

    #[tokio::test]
    async fn test_dispatch_one_success() {
        let gateway = MockGateway::new();
        let outcome = dispatch_one(&gateway, &record(1, "Ada", "08012345678")).await;

        assert!(outcome.delivered);
        assert_eq!(outcome.birthday_id, 1);

        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "2348012345678@c.us");
        assert!(sent[0].1.contains("Ada"));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_the_rest() {
        let gateway = Arc::new(MockGateway::failing_on("2348000000000@c.us"));
        let matches = vec![
            record(1, "Ada", "08012345678"),
            record(2, "Grace", "08000000000"),
            record(3, "Alan", "08099999999"),
        ];

        let outcomes = dispatch_all(gateway.clone(), &matches).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].delivered);
        assert!(!outcomes[1].delivered);
        assert_eq!(outcomes[1].error.as_deref(), Some("delivery refused"));
        assert!(outcomes[2].delivered);

        assert_eq!(gateway.sent.lock().unwrap().len(), 2);
    }
}
