//! Upfront advance lifecycle and recoupment math.
//!
//! An advance is cash paid to an author ahead of sales and recouped via an
//! elevated cut of subsequent sales of the scoped book (or all of the
//! author's books). See [`AdvanceStatus`](folio_types::AdvanceStatus) for
//! the lifecycle; only approved advances participate in settlement, and
//! only the settlement engine moves one to completed.

use folio_db::queries::advances;
use folio_types::{AdvanceId, BookId, Money, Percent, UserId};
use rusqlite::Connection;

use crate::{Result, SettlementError};

/// Minimum advance an author may request: 1000.00 XAF.
pub const MIN_ADVANCE_REQUEST: Money = Money::from_major(1_000);

/// Maximum repayment rate: 50%.
pub const MAX_REPAYMENT_BPS: i64 = 5_000;

/// Default repayment rate offered at application time: 20%.
pub const DEFAULT_REPAYMENT_BPS: i64 = 2_000;

fn validate_repayment_rate(rate: Percent) -> Result<()> {
    if rate.bps() > MAX_REPAYMENT_BPS {
        return Err(SettlementError::RepaymentRateTooHigh {
            rate,
            maximum: Percent::from_bps(MAX_REPAYMENT_BPS).unwrap_or(Percent::ZERO),
        });
    }
    Ok(())
}

/// Submit an advance application on behalf of an author.
///
/// # Errors
///
/// - [`SettlementError::AdvanceBelowMinimum`] for requests under 1000 XAF
/// - [`SettlementError::RepaymentRateTooHigh`] for rates above 50%
pub fn apply(
    conn: &Connection,
    author: UserId,
    book: Option<BookId>,
    amount_requested: Money,
    repayment_rate: Percent,
    reason: &str,
    now: u64,
) -> Result<AdvanceId> {
    if amount_requested < MIN_ADVANCE_REQUEST {
        return Err(SettlementError::AdvanceBelowMinimum {
            amount: amount_requested,
            minimum: MIN_ADVANCE_REQUEST,
        });
    }
    validate_repayment_rate(repayment_rate)?;

    let id = advances::insert(conn, author, book, amount_requested, repayment_rate, reason, now)?;
    tracing::info!(advance = id, author, amount = %amount_requested, "advance application submitted");
    Ok(id)
}

/// Staff approval: fixes the repayment rate and stamps the approval time.
pub fn approve(conn: &Connection, id: AdvanceId, repayment_rate: Percent, now: u64) -> Result<()> {
    validate_repayment_rate(repayment_rate)?;
    advances::approve(conn, id, repayment_rate, now)?;
    tracing::info!(advance = id, rate = %repayment_rate, "advance approved");
    Ok(())
}

/// Staff rejection of an in-review application.
pub fn reject(conn: &Connection, id: AdvanceId, reason: &str) -> Result<()> {
    advances::reject(conn, id, reason)?;
    tracing::info!(advance = id, "advance rejected");
    Ok(())
}

/// Manual cancellation before full recoupment.
pub fn cancel(conn: &Connection, id: AdvanceId) -> Result<()> {
    advances::cancel(conn, id)?;
    tracing::info!(advance = id, "advance cancelled");
    Ok(())
}

/// The deduction one sale contributes toward one advance.
///
/// `candidate = gross × repayment_rate` (half-up), then clamped so it never
/// exceeds what the advance still needs nor what is left of the author's
/// share. Returns `None` on overflow.
pub fn recoupment_deduction(
    gross: Money,
    repayment_rate: Percent,
    remaining: Money,
    available_share: Money,
) -> Option<Money> {
    let candidate = gross.percent_of(repayment_rate)?;
    Some(candidate.min(remaining).min(available_share))
}
