//! Payment query functions.
//!
//! The `payments` row doubles as the idempotency key for settlement: the
//! claim UPDATE flips `status` to `settled` only when it is not already,
//! and runs inside the same transaction as every balance mutation. A
//! redelivered completion callback finds nothing to claim.

use folio_types::{Money, PaymentEvent, ProductKind, SettlementResult, UserId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// A raw payment row.
#[derive(Clone, Debug)]
pub struct PaymentRow {
    pub payment_id: String,
    pub status: String,
    pub kind: Option<ProductKind>,
    pub gross_amount: Money,
    pub payer: UserId,
    pub recipient: UserId,
    pub platform_commission: Money,
    pub referral_commission: Money,
    pub advance_recouped: Money,
    pub recipient_net: Money,
    pub settled_at: Option<u64>,
}

/// Record a pending payment for an event, if not already present.
///
/// Safe to call on redelivery: an existing row (whatever its status) is
/// left untouched.
pub fn insert_pending(conn: &Connection, event: &PaymentEvent, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO payments
         (payment_id, kind, gross_amount, payer_id, recipient_id, referrer_id,
          book_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            event.payment_id,
            event.kind.as_str(),
            event.gross_amount.minor(),
            event.payer,
            event.recipient,
            event.referrer,
            event.book_id,
            created_at as i64,
        ],
    )?;
    Ok(())
}

/// Claim a payment for settlement.
///
/// Returns `true` if this call flipped the row to `settled`; `false` if
/// the payment was already settled. Failed payments are claimable again
/// (a settlement retry after a transient error).
pub fn claim(conn: &Connection, payment_id: &str, settled_at: u64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE payments SET status = 'settled', settled_at = ?1
         WHERE payment_id = ?2 AND status != 'settled'",
        rusqlite::params![settled_at as i64, payment_id],
    )?;
    if updated > 0 {
        return Ok(true);
    }
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE payment_id = ?1",
        [payment_id],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DbError::NotFound(format!("payment '{payment_id}'")));
    }
    Ok(false)
}

/// Mark a payment as failed.
pub fn mark_failed(conn: &Connection, payment_id: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE payments SET status = 'failed'
         WHERE payment_id = ?1 AND status = 'pending'",
        [payment_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "pending payment '{payment_id}'"
        )));
    }
    Ok(())
}

/// Record the final split on a settled payment row.
pub fn record_split(
    conn: &Connection,
    payment_id: &str,
    result: &SettlementResult,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE payments
         SET platform_commission = ?1, referral_commission = ?2,
             advance_recouped = ?3, recipient_net = ?4
         WHERE payment_id = ?5",
        rusqlite::params![
            result.platform_commission.minor(),
            result.referral_commission.minor(),
            result.advance_recouped.minor(),
            result.recipient_net.minor(),
            payment_id,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("payment '{payment_id}'")));
    }
    Ok(())
}

/// Fetch one payment by id.
pub fn get(conn: &Connection, payment_id: &str) -> Result<PaymentRow> {
    conn.query_row(
        "SELECT payment_id, status, kind, gross_amount, payer_id, recipient_id,
                platform_commission, referral_commission, advance_recouped,
                recipient_net, settled_at
         FROM payments WHERE payment_id = ?1",
        [payment_id],
        |row| {
            Ok(PaymentRow {
                payment_id: row.get(0)?,
                status: row.get(1)?,
                kind: ProductKind::parse(&row.get::<_, String>(2)?),
                gross_amount: Money::from_minor(row.get(3)?),
                payer: row.get(4)?,
                recipient: row.get(5)?,
                platform_commission: Money::from_minor(row.get(6)?),
                referral_commission: Money::from_minor(row.get(7)?),
                advance_recouped: Money::from_minor(row.get(8)?),
                recipient_net: Money::from_minor(row.get(9)?),
                settled_at: row.get::<_, Option<i64>>(10)?.map(|t| t as u64),
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("payment '{payment_id}'"))
        }
        other => DbError::Sqlite(other),
    })
}
