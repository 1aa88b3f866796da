// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmation reply parsing.
//!
//! Detects affirmative and negative replies in free text against a small
//! fixed vocabulary, word-boundary matched after case and diacritic folding.
//! Anything ambiguous or unmatched is `None` and falls through to normal
//! intent classification; it is never treated as a denial.

use mordomo_core::text::fold_text;

/// Outcome of parsing a reply to a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyIntent {
    Confirmed,
    Denied,
    /// Not recognizably yes or no; the message continues down the
    /// classification pipeline.
    None,
}

/// Affirmative vocabulary, in folded form.
const AFFIRMATIVE: &[&str] = &[
    "sim", "s", "ok", "confirmo", "confirma", "confirmar", "isso", "claro", "pode", "certo",
    "beleza", "yes",
];

/// Negative vocabulary, in folded form.
const NEGATIVE: &[&str] = &[
    "nao", "n", "cancela", "cancelar", "errado", "negativo", "no", "nope",
];

/// Parses free text into a confirmation reply.
pub fn parse_reply(text: &str) -> ReplyIntent {
    let folded = fold_text(text);

    let mut affirmative = text.contains('👍');
    let mut negative = false;

    for token in folded.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if AFFIRMATIVE.contains(&token) {
            affirmative = true;
        }
        if NEGATIVE.contains(&token) {
            negative = true;
        }
    }

    match (affirmative, negative) {
        (true, false) => ReplyIntent::Confirmed,
        (false, true) => ReplyIntent::Denied,
        // Mixed signals are ambiguous, not a denial.
        _ => ReplyIntent::None,
    }
}
