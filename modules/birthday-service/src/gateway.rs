//! Seam to the external WhatsApp gateway process.
//!
//! The gateway owns the hard parts — session, auth, pairing, delivery — and
//! exposes them over HTTP/JSON. This module wraps that surface behind the
//! `Gateway` trait and runs the incoming-message poll loop that feeds
//! ingestion.

use crate::db::Db;
use crate::ingest;
use async_trait::async_trait;
use birthday_types::IncomingMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;

/// Outbound-message seam. The daily job only ever needs this one operation,
/// so tests swap in a mock that records calls.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send_message(&self, address: &str, body: &str) -> Result<(), String>;
}

// =====================================================
// HTTP implementation
// =====================================================

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StateResponse {
    /// `ready`, `auth_failure`, `disconnected`, or `connecting`.
    state: String,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    messages: Vec<IncomingMessage>,
    #[serde(default)]
    cursor: Option<String>,
}

pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn connection_state(&self) -> Result<StateResponse, String> {
        let url = format!("{}/rpc/state", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Gateway unreachable: {}", e))?;
        resp.json::<StateResponse>()
            .await
            .map_err(|e| format!("Bad state response: {}", e))
    }

    /// Incoming messages newer than `after` (a gateway-assigned cursor).
    async fn fetch_messages(&self, after: Option<&str>) -> Result<MessagesResponse, String> {
        let url = format!("{}/rpc/messages", self.base_url);
        let mut req = self.client.get(&url);
        if let Some(after) = after {
            req = req.query(&[("after", after)]);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| format!("Gateway unreachable: {}", e))?;
        resp.json::<MessagesResponse>()
            .await
            .map_err(|e| format!("Bad messages response: {}", e))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send_message(&self, address: &str, body: &str) -> Result<(), String> {
        let url = format!("{}/rpc/send", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SendRequest { to: address, body })
            .send()
            .await
            .map_err(|e| format!("Gateway unreachable: {}", e))?;

        let parsed: SendResponse = resp
            .json()
            .await
            .map_err(|e| format!("Bad send response: {}", e))?;

        if parsed.success {
            Ok(())
        } else {
            Err(parsed
                .error
                .unwrap_or_else(|| "Send rejected by gateway".to_string()))
        }
    }
}

// =====================================================
// Incoming-message poll loop
// =====================================================

pub async fn run_poll_loop(
    db: Arc<Db>,
    gateway: Arc<HttpGateway>,
    expected_sender: String,
    poll_interval_secs: u64,
    last_tick_at: Arc<Mutex<Option<String>>>,
) {
    log::info!(
        "[BIRTHDAY_BOT] Message poll loop started (interval: {}s)",
        poll_interval_secs
    );

    let mut ticker = interval(Duration::from_secs(poll_interval_secs.max(1)));
    let mut last_state: Option<String> = None;
    let mut cursor: Option<String> = None;

    loop {
        ticker.tick().await;

        match poll_tick(&db, &gateway, &expected_sender, &mut last_state, &mut cursor).await {
            Ok(_) => {
                let now = chrono::Utc::now().to_rfc3339();
                *last_tick_at.lock().await = Some(now);
            }
            Err(e) => {
                log::error!("[BIRTHDAY_BOT] Poll tick error: {}", e);
            }
        }
    }
}

async fn poll_tick(
    db: &Db,
    gateway: &HttpGateway,
    expected_sender: &str,
    last_state: &mut Option<String>,
    cursor: &mut Option<String>,
) -> Result<(), String> {
    let state = gateway.connection_state().await?;

    if last_state.as_deref() != Some(state.state.as_str()) {
        log_state_transition(&state.state, state.detail.as_deref());
        *last_state = Some(state.state.clone());
    }

    // Nothing to receive until the session is up; remediation is external.
    if state.state != "ready" {
        return Ok(());
    }

    let batch = gateway.fetch_messages(cursor.as_deref()).await?;

    for msg in &batch.messages {
        ingest::handle_incoming(db, expected_sender, msg);
    }

    if let Some(next_cursor) = batch.cursor {
        *cursor = Some(next_cursor);
    } else if let Some(last) = batch.messages.last() {
        *cursor = Some(last.id.clone());
    }

    Ok(())
}

fn log_state_transition(state: &str, detail: Option<&str>) {
    let detail = detail.unwrap_or("");
    match state {
        "ready" => log::info!("[BIRTHDAY_BOT] Gateway session ready"),
        "auth_failure" => {
            log::error!("[BIRTHDAY_BOT] Gateway authentication failed: {}", detail)
        }
        "disconnected" => {
            log::warn!("[BIRTHDAY_BOT] Gateway disconnected: {}", detail)
        }
        other => log::debug!("[BIRTHDAY_BOT] Gateway state: {} {}", other, detail),
    }
}
