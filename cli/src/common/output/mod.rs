//! # ddev Output Sink
//!
//! File: cli/src/common/output/mod.rs
//!
//! ## Overview
//!
//! The single rendering sink every user-facing event passes through.
//! Command handlers never print to stdout directly; they emit events here
//! and the sink decides between human text and machine output.
//!
//! ## Architecture
//!
//! Two modes, chosen once per invocation by the `-j/--json` flag:
//! - **Human**: plain lines to stdout, with ✅ / ⚠️ / ❌ prefixes for
//!   success, warning, and failure events.
//! - **JSON**: one newline-delimited object per event with keys `level`
//!   (`info`|`warning`|`error`), `msg`, `time` (RFC3339), and an optional
//!   `raw` command-specific payload.
//!
//! Confirmation prompts also live here so `DDEV_NONINTERACTIVE` is honoured
//! in exactly one place.
//!
use crate::core::config;
use chrono::Utc;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

/// Event severity for the machine-readable stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// The output sink. Cheap to clone into helpers that need to report.
#[derive(Debug, Clone)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Output { json }
    }

    pub fn json_mode(&self) -> bool {
        self.json
    }

    /// Neutral informational event.
    pub fn info(&self, msg: &str) {
        self.emit(Level::Info, msg, None, "");
    }

    /// Success event (human mode gets a ✅ prefix).
    pub fn success(&self, msg: &str) {
        self.emit(Level::Info, msg, None, "✅ ");
    }

    pub fn warning(&self, msg: &str) {
        self.emit(Level::Warning, msg, None, "⚠️ ");
    }

    pub fn failure(&self, msg: &str) {
        self.emit(Level::Error, msg, None, "❌ ");
    }

    /// Informational event carrying a command-specific structured payload.
    pub fn info_with(&self, msg: &str, raw: Value) {
        self.emit(Level::Info, msg, Some(raw), "");
    }

    pub fn success_with(&self, msg: &str, raw: Value) {
        self.emit(Level::Info, msg, Some(raw), "✅ ");
    }

    fn emit(&self, level: Level, msg: &str, raw: Option<Value>, prefix: &str) {
        if self.json {
            println!("{}", record(level, msg, raw));
        } else {
            match level {
                Level::Error => eprintln!("{}{}", prefix, msg),
                _ => println!("{}{}", prefix, msg),
            }
        }
    }

    /// Asks the user to confirm a destructive action. Returns `true`
    /// without prompting when `assume_yes` is set or prompts are disabled
    /// via `DDEV_NONINTERACTIVE`.
    pub fn confirm(&self, prompt: &str, assume_yes: bool) -> bool {
        if assume_yes || config::noninteractive() {
            return true;
        }
        print!("{} [y/N] ", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes" | "YES")
    }
}

/// Builds one JSON record. Split out so tests can assert the exact shape.
fn record(level: Level, msg: &str, raw: Option<Value>) -> String {
    let mut obj = json!({
        "level": level.as_str(),
        "msg": msg,
        "time": Utc::now().to_rfc3339(),
    });
    if let Some(raw) = raw {
        obj["raw"] = raw;
    }
    obj.to_string()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_shape() {
        let line = record(Level::Info, "project started", None);
        let parsed: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["msg"], "project started");
        assert!(parsed["time"].as_str().unwrap().contains('T'));
        assert!(parsed.get("raw").is_none());
    }

    #[test]
    fn test_record_with_raw_payload() {
        let line = record(
            Level::Warning,
            "sync stalled",
            Some(json!({"session": "demo"})),
        );
        let parsed: Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(parsed["level"], "warning");
        assert_eq!(parsed["raw"]["session"], "demo");
    }

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Info.as_str(), "info");
        assert_eq!(Level::Warning.as_str(), "warning");
        assert_eq!(Level::Error.as_str(), "error");
    }
}
