// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shopping list reads used by invoice reconciliation.
//!
//! List management itself belongs to the CRUD surface; this module only
//! exposes what the resolver needs, plus seeding helpers for tests.

use chrono::Utc;
use mordomo_core::MordomoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ShoppingItem;
use crate::queries::fmt_ts;

/// Unpurchased items on open shopping lists.
pub async fn open_items(db: &Database) -> Result<Vec<ShoppingItem>, MordomoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, i.list_id, i.name, i.quantity, i.purchased
                 FROM shopping_items i
                 JOIN shopping_lists l ON l.id = i.list_id
                 WHERE l.status = 'open' AND i.purchased = 0
                 ORDER BY i.id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ShoppingItem {
                    id: row.get(0)?,
                    list_id: row.get(1)?,
                    name: row.get(2)?,
                    quantity: row.get(3)?,
                    purchased: row.get::<_, i64>(4)? != 0,
                })
            })?;
            let items = rows.collect::<Result<Vec<_>, rusqlite::Error>>()?;
            Ok(items)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Marks a shopping item purchased.
pub async fn mark_purchased(db: &Database, item_id: i64) -> Result<(), MordomoError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE shopping_items SET purchased = 1 WHERE id = ?1",
                params![item_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Creates an open shopping list. Returns the list id.
pub async fn create_list(db: &Database) -> Result<i64, MordomoError> {
    let now = fmt_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO shopping_lists (status, created_at) VALUES ('open', ?1)",
                params![now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Adds an item to a list. Returns the item id.
pub async fn add_item(
    db: &Database,
    list_id: i64,
    name: &str,
    quantity: Option<f64>,
) -> Result<i64, MordomoError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO shopping_items (list_id, name, quantity) VALUES (?1, ?2, ?3)",
                params![list_id, name, quantity],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_items_excludes_purchased() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("shop.db").to_str().unwrap())
            .await
            .unwrap();

        let list = create_list(&db).await.unwrap();
        let arroz = add_item(&db, list, "Arroz", Some(2.0)).await.unwrap();
        add_item(&db, list, "Feijão", None).await.unwrap();

        assert_eq!(open_items(&db).await.unwrap().len(), 2);

        mark_purchased(&db, arroz).await.unwrap();
        let remaining = open_items(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Feijão");

        db.close().await.unwrap();
    }
}
