//! User and earnings-balance query functions.
//!
//! Balance mutations are expressed as SQL increments inside the caller's
//! transaction, never as read-modify-write in Rust, so concurrent
//! settlements for the same user cannot race.

use folio_types::{Money, UserId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a user, returning the new id.
pub fn insert(
    conn: &Connection,
    email: &str,
    display_name: &str,
    referral_code: Option<&str>,
    created_at: u64,
) -> Result<UserId> {
    conn.execute(
        "INSERT INTO users (email, display_name, referral_code, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![email, display_name, referral_code, created_at as i64],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a user's earnings balance.
pub fn earnings_balance(conn: &Connection, user: UserId) -> Result<Money> {
    let minor: i64 = conn
        .query_row(
            "SELECT earnings_balance FROM users WHERE id = ?1",
            [user],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("user {user}")),
            other => DbError::Sqlite(other),
        })?;
    Ok(Money::from_minor(minor))
}

/// Look up a user id by referral code.
pub fn by_referral_code(conn: &Connection, code: &str) -> Result<UserId> {
    conn.query_row(
        "SELECT id FROM users WHERE referral_code = ?1",
        [code],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("referral code '{code}'"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Credit a user's earnings balance by an atomic increment.
pub fn credit_earnings(conn: &Connection, user: UserId, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(DbError::Constraint(format!(
            "credit amount must be non-negative, got {amount}"
        )));
    }
    let updated = conn.execute(
        "UPDATE users SET earnings_balance = earnings_balance + ?1 WHERE id = ?2",
        rusqlite::params![amount.minor(), user],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("user {user}")));
    }
    Ok(())
}

/// Debit a user's earnings balance, preconditioned on sufficient funds.
///
/// The balance check and the decrement are one statement; zero rows
/// updated means the funds were not there at commit time.
pub fn debit_earnings(conn: &Connection, user: UserId, amount: Money) -> Result<()> {
    if amount.is_negative() {
        return Err(DbError::Constraint(format!(
            "debit amount must be non-negative, got {amount}"
        )));
    }
    let updated = conn.execute(
        "UPDATE users SET earnings_balance = earnings_balance - ?1
         WHERE id = ?2 AND earnings_balance >= ?1",
        rusqlite::params![amount.minor(), user],
    )?;
    if updated == 0 {
        // Distinguish a missing user from an underfunded one.
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE id = ?1",
            [user],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(DbError::NotFound(format!("user {user}")));
        }
        return Err(DbError::Constraint(format!(
            "insufficient balance for user {user}: need {amount}"
        )));
    }
    Ok(())
}
