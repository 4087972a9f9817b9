//! The settlement transaction.
//!
//! [`settle`] converts one completed gross payment into balance deltas for
//! the platform, the recipient, an optional referrer, and any approved
//! upfront advances, all inside a single immediate SQLite transaction.
//! The payment-claim UPDATE doubles as the idempotency check: a second
//! delivery of the same completion callback finds the payment already
//! settled and nothing moves.
//!
//! Conservation holds for every settlement:
//! `platform + referral + advance + net == gross`, exactly. There is one
//! code path; a payment with no referrer and no advances takes the same
//! path with zero deductions.

use folio_db::queries::{advances, payments, settings, users};
use folio_types::{AdvanceStatus, Money, PaymentEvent, ProductKind, SettlementEvent, SettlementResult};
use rusqlite::{Connection, TransactionBehavior};

use crate::{advance, rates, Result, SettlementError};

/// The result of one settlement plus the domain events it produced.
///
/// The caller routes the events to notification infrastructure; the engine
/// itself never sends anything.
#[derive(Clone, Debug)]
pub struct SettlementOutcome {
    pub result: SettlementResult,
    pub events: Vec<SettlementEvent>,
}

/// Settle one completed payment.
///
/// Runs as a single immediate transaction; on any error nothing is
/// committed and the payment stays claimable for a later retry.
///
/// # Errors
///
/// - [`SettlementError::InvalidAmount`] for a negative gross amount
/// - [`SettlementError::AlreadySettled`] if this payment id was settled
///   before (the call is a no-op)
/// - [`SettlementError::Db`] on storage failure
pub fn settle(conn: &mut Connection, event: &PaymentEvent, now: u64) -> Result<SettlementOutcome> {
    validate(event)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(folio_db::DbError::Sqlite)?;
    let outcome = settle_in_tx(&tx, event, now)?;
    tx.commit().map_err(folio_db::DbError::Sqlite)?;
    Ok(outcome)
}

fn validate(event: &PaymentEvent) -> Result<()> {
    if event.gross_amount.is_negative() {
        return Err(SettlementError::InvalidAmount {
            amount: event.gross_amount,
        });
    }
    Ok(())
}

/// The settlement body, composable into a larger transaction
/// (see [`crate::balance::purchase_with_balance`]).
pub(crate) fn settle_in_tx(
    conn: &Connection,
    event: &PaymentEvent,
    now: u64,
) -> Result<SettlementOutcome> {
    let gross = event.gross_amount;

    // Claim the payment. This is the exactly-once gate.
    payments::insert_pending(conn, event, now)?;
    if !payments::claim(conn, &event.payment_id, now)? {
        return Err(SettlementError::AlreadySettled {
            payment_id: event.payment_id.clone(),
        });
    }

    // Config snapshots for this settlement only.
    let commission = settings::commission(conn)?;
    let referral = settings::referral(conn)?;

    let rate = rates::resolve_rate(event.kind, event.custom_rate, &commission);
    let platform_commission = gross.percent_of(rate).ok_or(SettlementError::Overflow)?;
    let mut recipient_share = gross
        .checked_sub(platform_commission)
        .ok_or(SettlementError::Overflow)?;

    let mut events = Vec::new();

    // Referral commission: a cut of the gross, paid out of the recipient
    // share, never out of the platform commission. Self-referrals
    // (referrer is the payer or the recipient) earn nothing.
    let referral_commission = match eligible_referrer(event) {
        Some(referrer) => {
            let cut = gross
                .percent_of(referral.effective_percent())
                .ok_or(SettlementError::Overflow)?
                .min(recipient_share);
            if !cut.is_zero() {
                users::credit_earnings(conn, referrer, cut)?;
                recipient_share = recipient_share
                    .checked_sub(cut)
                    .ok_or(SettlementError::Overflow)?;
                events.push(SettlementEvent::ReferralCredited {
                    user: referrer,
                    amount: cut,
                });
            }
            cut
        }
        None => Money::ZERO,
    };

    // Advance recoupment, oldest advance first. Donations never recoup.
    // A sale without a book of its own still services all-books advances.
    let mut advance_recouped = Money::ZERO;
    if event.kind != ProductKind::Donation {
        for row in advances::approved_fifo(conn, event.recipient, event.book_id)? {
            if recipient_share.is_zero() {
                break;
            }
            let deduction = advance::recoupment_deduction(
                gross,
                row.repayment_rate,
                row.remaining(),
                recipient_share,
            )
            .ok_or(SettlementError::Overflow)?;
            if deduction.is_zero() {
                continue;
            }
            let updated = advances::record_recoupment(conn, row.id, deduction, now)?;
            recipient_share = recipient_share
                .checked_sub(deduction)
                .ok_or(SettlementError::Overflow)?;
            advance_recouped = advance_recouped
                .checked_add(deduction)
                .ok_or(SettlementError::Overflow)?;
            events.push(SettlementEvent::AdvanceRecouped {
                advance: row.id,
                amount: deduction,
                remaining: updated.remaining(),
            });
            if updated.status == AdvanceStatus::Completed {
                events.push(SettlementEvent::AdvanceCompleted { advance: row.id });
                tracing::info!(advance = row.id, "advance fully recouped");
            }
        }
    }

    // Whatever is left belongs to the recipient.
    users::credit_earnings(conn, event.recipient, recipient_share)?;
    events.push(SettlementEvent::RecipientCredited {
        user: event.recipient,
        amount: recipient_share,
    });

    let result = SettlementResult {
        platform_commission,
        referral_commission,
        advance_recouped,
        recipient_net: recipient_share,
    };
    if result.total() != Some(gross) {
        // Every branch above clamps against the running share, so the four
        // legs always reassemble the gross amount.
        return Err(SettlementError::Overflow);
    }
    payments::record_split(conn, &event.payment_id, &result)?;

    tracing::info!(
        payment = %event.payment_id,
        gross = %gross,
        platform = %platform_commission,
        referral = %referral_commission,
        recouped = %advance_recouped,
        net = %recipient_share,
        "payment settled"
    );

    Ok(SettlementOutcome { result, events })
}

/// A referrer only counts when distinct from both payer and recipient.
fn eligible_referrer(event: &PaymentEvent) -> Option<folio_types::UserId> {
    event
        .referrer
        .filter(|&r| r != event.payer && r != event.recipient)
}
