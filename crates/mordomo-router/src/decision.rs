// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence decision policy.
//!
//! Attendance punches follow the confidence/explicit-time table; the
//! record kinds (document, delivery, invoice, receipt, suggestion) are
//! irreversible-but-uncertain and always ask for confirmation. Silent
//! replay never asks: it auto-applies at the auto thresholds and drops the
//! confirm band.

use chrono::NaiveTime;
use mordomo_core::text::meaningful_chars;
use mordomo_core::types::{ClassifiedIntent, IntentKind};

/// Auto-apply threshold when the message names an explicit time.
pub const AUTO_APPLY_EXPLICIT: u8 = 90;
/// Auto-apply threshold when the punch uses the message time.
pub const AUTO_APPLY_IMPLICIT: u8 = 80;
/// Below this confidence no action is taken on the classified kind.
pub const CONFIRM_FLOOR: u8 = 50;
/// Minimum word characters for the suggestion fallback: anything shorter is
/// noise and is dropped silently.
pub const SUGGESTION_MIN_CHARS: usize = 5;

/// What the router does with a classified intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Commit immediately; `time` is the punch time (explicit or message).
    AutoApply { time: NaiveTime },
    /// Ask before committing; `time` is the punch time to confirm.
    Confirm { time: NaiveTime },
    /// No usable intent, but the text is substantive: record a suggestion.
    SuggestionFallback,
    /// Nothing to do.
    Ignore,
}

/// Applies the decision policy to a classified intent.
pub fn decide(
    intent: &ClassifiedIntent,
    message_time: NaiveTime,
    text: &str,
    silent: bool,
) -> Decision {
    let time = intent.explicit_time.unwrap_or(message_time);

    if intent.kind == IntentKind::None || intent.confidence < CONFIRM_FLOOR {
        if meaningful_chars(text) >= SUGGESTION_MIN_CHARS {
            return Decision::SuggestionFallback;
        }
        return Decision::Ignore;
    }

    if intent.kind.is_punch() {
        let auto = match intent.explicit_time {
            Some(_) => intent.confidence >= AUTO_APPLY_EXPLICIT,
            None => intent.confidence >= AUTO_APPLY_IMPLICIT,
        };
        return match (auto, silent) {
            (true, _) => Decision::AutoApply { time },
            (false, false) => Decision::Confirm { time },
            // Replay never asks; ambiguous punches are dropped.
            (false, true) => Decision::Ignore,
        };
    }

    // Record kinds commit irreversible state from uncertain extraction:
    // always confirm outside of replay.
    if silent {
        if intent.confidence >= AUTO_APPLY_IMPLICIT {
            Decision::AutoApply { time }
        } else {
            Decision::Ignore
        }
    } else {
        Decision::Confirm { time }
    }
}
