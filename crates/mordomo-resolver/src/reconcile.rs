// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice line item reconciliation against the open shopping list.

use mordomo_core::text::fold_text;
use mordomo_core::types::{ExtractedItem, ShoppingItem};

/// Returns the ids of open shopping items matched by the invoice line items.
///
/// Matching is by folded name: exact match, or one name containing the other
/// ("arroz" on the list matches "arroz integral 5kg" on the invoice). Each
/// shopping item is matched at most once.
pub fn match_items(invoice_items: &[ExtractedItem], open_items: &[ShoppingItem]) -> Vec<i64> {
    let invoice_names: Vec<String> = invoice_items
        .iter()
        .map(|i| fold_text(i.name.trim()))
        .filter(|n| !n.is_empty())
        .collect();

    let mut matched = Vec::new();
    for item in open_items {
        let list_name = fold_text(item.name.trim());
        if list_name.is_empty() {
            continue;
        }
        let hit = invoice_names
            .iter()
            .any(|inv| inv == &list_name || inv.contains(&list_name) || list_name.contains(inv));
        if hit {
            matched.push(item.id);
        }
    }
    matched
}
