//! Token usage reporting
//!
//! Chat calls forward the provider's `usage` object to an optional
//! [`UsageTracker`]. Forwarding is best-effort: a failing tracker is logged
//! and never fails the call that produced the usage.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Token counts reported for one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenCounts {
    /// Read counts from a provider `usage` object; missing fields are 0
    pub fn from_usage(usage: &Value) -> Self {
        let field = |name: &str| usage.get(name).and_then(Value::as_u64).unwrap_or(0);

        Self {
            prompt_tokens: field("prompt_tokens"),
            completion_tokens: field("completion_tokens"),
            total_tokens: field("total_tokens"),
        }
    }
}

/// Receiver for token usage, shared across concurrent calls
pub trait UsageTracker: Send + Sync {
    fn add_usage(&self, counts: TokenCounts) -> Result<()>;
}

/// Forward `usage` to `tracker` if both are present. `usage` must be an
/// object; `null` (sent on every delta by some streams) is ignored.
pub(crate) fn record_usage(tracker: Option<&dyn UsageTracker>, usage: Option<&Value>) {
    let (Some(tracker), Some(usage)) = (tracker, usage.filter(|u| u.is_object())) else {
        return;
    };

    let counts = TokenCounts::from_usage(usage);
    match tracker.add_usage(counts) {
        Ok(()) => debug!("Token usage: {:?}", counts),
        Err(e) => warn!("Failed to record token usage {:?}: {}", counts, e),
    }
}

/// Snapshot of accumulated usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Lock-free accumulating tracker
#[derive(Debug, Default)]
pub struct TokenTracker {
    calls: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> UsageSummary {
        UsageSummary {
            calls: self.calls.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.prompt_tokens.store(0, Ordering::Relaxed);
        self.completion_tokens.store(0, Ordering::Relaxed);
        self.total_tokens.store(0, Ordering::Relaxed);
    }
}

impl UsageTracker for TokenTracker {
    fn add_usage(&self, counts: TokenCounts) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompt_tokens.fetch_add(counts.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens.fetch_add(counts.completion_tokens, Ordering::Relaxed);
        self.total_tokens.fetch_add(counts.total_tokens, Ordering::Relaxed);
        Ok(())
    }
}
