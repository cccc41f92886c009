//! Shared types for the birthday bot service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

/// A stored birthday entry.
///
/// All three user-supplied fields are optional: ingestion preserves whatever
/// the inbound message contained and never enforces required fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdayRecord {
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// `DD-MM`, zero-padded, no year. Stored as-is, no calendar validation.
    pub birthday: Option<String>,
    pub created_at: String,
}

/// An incoming chat message polled from the external WhatsApp gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub body: String,
}

// =====================================================
// Dispatch Types
// =====================================================

/// Outcome of one greeting send attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub birthday_id: i64,
    pub name: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn sent(birthday_id: i64, name: impl Into<String>) -> Self {
        Self {
            birthday_id,
            name: name.into(),
            delivered: true,
            error: None,
        }
    }

    pub fn failed(birthday_id: i64, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            birthday_id,
            name: name.into(),
            delivered: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregated result of one daily job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRunSummary {
    pub ran_at: String,
    /// The `DD-MM` key the run matched against.
    pub date_key: String,
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
    /// Matches skipped because a greeting already went out today.
    pub skipped: usize,
}

// =====================================================
// RPC Types
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub service: String,
    pub uptime_secs: u64,
    pub record_count: i64,
    pub poll_interval_secs: u64,
    pub last_tick_at: Option<String>,
    pub last_run: Option<DailyRunSummary>,
}

/// Generic RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
