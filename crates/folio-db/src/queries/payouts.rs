//! Payout request query functions.

use folio_types::{Money, UserId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// A payout request row.
#[derive(Clone, Debug)]
pub struct PayoutRow {
    pub id: i64,
    pub user: UserId,
    pub amount: Money,
    /// `pending`, `paid`, or `denied`.
    pub status: String,
    pub created_at: u64,
}

/// Insert a new payout request in `pending` state.
///
/// The balance debit is the caller's responsibility; the two belong in one
/// transaction.
pub fn insert(conn: &Connection, user: UserId, amount: Money, created_at: u64) -> Result<i64> {
    conn.execute(
        "INSERT INTO payout_requests (user_id, amount, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![user, amount.minor(), created_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch one payout request by id.
pub fn get(conn: &Connection, id: i64) -> Result<PayoutRow> {
    conn.query_row(
        "SELECT id, user_id, amount, status, created_at
         FROM payout_requests WHERE id = ?1",
        [id],
        |row| {
            Ok(PayoutRow {
                id: row.get(0)?,
                user: row.get(1)?,
                amount: Money::from_minor(row.get(2)?),
                status: row.get(3)?,
                created_at: row.get::<_, i64>(4)? as u64,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("payout {id}")),
        other => DbError::Sqlite(other),
    })
}
