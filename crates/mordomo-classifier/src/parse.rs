// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier output parsing: strict structure first, permissive pattern
//! extraction second, no-intent last.
//!
//! The external service is asked for a JSON object but routinely wraps it in
//! code fences, prose, or near-miss field names. Parsing never fails: any
//! text that yields no usable signal becomes `kind = none, confidence = 0`.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveTime;
use mordomo_core::types::{ClassificationSource, ClassifiedIntent, ExtractedFields, IntentKind};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// The structure the service is prompted to return.
#[derive(Debug, Deserialize)]
struct WireIntent {
    kind: String,
    confidence: f64,
    #[serde(default, alias = "time", alias = "explicitTime")]
    explicit_time: Option<String>,
    #[serde(default, alias = "extractedData")]
    extracted: Option<ExtractedFields>,
}

fn kind_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"["']?kind["']?\s*[:=]\s*["']?([a-z_]+)"#).expect("static regex")
    })
}

fn confidence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"["']?confidence["']?\s*[:=]\s*["']?(\d{1,3})"#).expect("static regex")
    })
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})[:h](\d{2})\b").expect("static regex"))
}

/// Parses raw classifier output into a [`ClassifiedIntent`]. Never fails.
pub fn parse_intent(raw: &str) -> ClassifiedIntent {
    let stripped = strip_code_fences(raw);

    // 1. Strict parse of the expected structure.
    if let Ok(wire) = serde_json::from_str::<WireIntent>(stripped) {
        if let Ok(kind) = IntentKind::from_str(wire.kind.trim()) {
            return ClassifiedIntent {
                kind,
                confidence: clamp_confidence(wire.confidence),
                explicit_time: wire.explicit_time.as_deref().and_then(parse_hhmm),
                extracted: wire.extracted,
                source: ClassificationSource::Structured,
            };
        }
    }

    // 2. Permissive extraction from near-miss text.
    if let Some(kind) = kind_regex()
        .captures(stripped)
        .and_then(|c| IntentKind::from_str(&c[1]).ok())
    {
        let confidence = confidence_regex()
            .captures(stripped)
            .and_then(|c| c[1].parse::<f64>().ok())
            .map(clamp_confidence)
            .unwrap_or(0);
        let explicit_time = time_regex()
            .captures(stripped)
            .and_then(|c| parse_hhmm(&format!("{}:{}", &c[1], &c[2])));
        debug!(kind = %kind, confidence, "classifier output recovered by fallback parse");
        return ClassifiedIntent {
            kind,
            confidence,
            explicit_time,
            extracted: None,
            source: ClassificationSource::FallbackParsed,
        };
    }

    // 3. Nothing usable.
    ClassifiedIntent::none()
}

/// Parses "H:MM" / "HH:MM" (also "8h30") into a time.
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw.trim().replace('h', ":");
    let mut parts = cleaned.splitn(2, ':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn clamp_confidence(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
