// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization shared by actor resolution, reply parsing, and
//! shopping reconciliation.

/// Strips a phone number down to its digits.
///
/// Channel sender ids arrive in assorted shapes ("+55 11 91234-5678",
/// "5511912345678@c.us"); everything except digits is noise for matching.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Folds text for case- and diacritic-insensitive matching: lowercases and
/// maps the accented characters that occur in Portuguese to their base form.
pub fn fold_text(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Counts the word characters in a message, used to decide whether
/// low-confidence text is substantive enough for the suggestion fallback.
pub fn meaningful_chars(raw: &str) -> usize {
    raw.chars().filter(|c| c.is_alphanumeric()).count()
}
