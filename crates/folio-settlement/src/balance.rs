//! Balance-debiting operations: payout requests and purchases paid from
//! platform credit.
//!
//! Both are preconditioned on sufficient balance and run as one
//! transaction, so a debit can never leave a balance negative or survive a
//! failed settlement.

use folio_db::queries::{payouts, users};
use folio_db::DbError;
use folio_types::{Money, PaymentEvent, UserId};
use rusqlite::{Connection, TransactionBehavior};

use crate::engine::{settle_in_tx, SettlementOutcome};
use crate::{Result, SettlementError};

/// Request a payout of accumulated earnings.
///
/// Debits the balance and records the payout request atomically; returns
/// the payout row id.
///
/// # Errors
///
/// - [`SettlementError::InvalidAmount`] for a non-positive amount
/// - [`SettlementError::InsufficientBalance`] if the balance cannot cover it
pub fn request_payout(
    conn: &mut Connection,
    user: UserId,
    amount: Money,
    now: u64,
) -> Result<i64> {
    if amount <= Money::ZERO {
        return Err(SettlementError::InvalidAmount { amount });
    }
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    debit(&tx, user, amount)?;
    let id = payouts::insert(&tx, user, amount, now)?;

    tx.commit().map_err(DbError::Sqlite)?;
    tracing::info!(user, amount = %amount, payout = id, "payout requested");
    Ok(id)
}

/// Purchase a book using accumulated earnings instead of an external
/// gateway.
///
/// Debits the payer's balance for the gross amount, then runs the full
/// settlement, all in the same transaction. The payer's debit and the
/// recipient's credit commit or roll back together.
pub fn purchase_with_balance(
    conn: &mut Connection,
    event: &PaymentEvent,
    now: u64,
) -> Result<SettlementOutcome> {
    if event.gross_amount.is_negative() {
        return Err(SettlementError::InvalidAmount {
            amount: event.gross_amount,
        });
    }
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DbError::Sqlite)?;

    debit(&tx, event.payer, event.gross_amount)?;
    let outcome = settle_in_tx(&tx, event, now)?;

    tx.commit().map_err(DbError::Sqlite)?;
    Ok(outcome)
}

fn debit(conn: &Connection, user: UserId, amount: Money) -> Result<()> {
    users::debit_earnings(conn, user, amount).map_err(|e| match e {
        DbError::Constraint(_) => SettlementError::InsufficientBalance {
            user,
            needed: amount,
        },
        other => SettlementError::Db(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_db::queries::books;
    use folio_types::ProductKind;

    fn setup() -> (Connection, UserId, UserId) {
        let conn = folio_db::open_memory().expect("open test db");
        let author =
            users::insert(&conn, "author@example.com", "Author", None, 1).expect("author");
        let buyer = users::insert(&conn, "buyer@example.com", "Buyer", None, 1).expect("buyer");
        (conn, author, buyer)
    }

    #[test]
    fn test_payout_debits_balance() {
        let (mut conn, author, _) = setup();
        users::credit_earnings(&conn, author, Money::from_major(9_000)).expect("credit");

        let id = request_payout(&mut conn, author, Money::from_major(5_000), 100).expect("payout");
        assert_eq!(
            users::earnings_balance(&conn, author).expect("balance"),
            Money::from_major(4_000)
        );

        let row = payouts::get(&conn, id).expect("payout row");
        assert_eq!(row.user, author);
        assert_eq!(row.amount, Money::from_major(5_000));
        assert_eq!(row.status, "pending");
    }

    #[test]
    fn test_payout_insufficient_balance() {
        let (mut conn, author, _) = setup();
        users::credit_earnings(&conn, author, Money::from_major(100)).expect("credit");

        let result = request_payout(&mut conn, author, Money::from_major(200), 100);
        assert!(matches!(
            result,
            Err(SettlementError::InsufficientBalance { .. })
        ));
        // No debit, no payout row.
        assert_eq!(
            users::earnings_balance(&conn, author).expect("balance"),
            Money::from_major(100)
        );
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM payout_requests", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_payout_rejects_zero() {
        let (mut conn, author, _) = setup();
        let result = request_payout(&mut conn, author, Money::ZERO, 100);
        assert!(matches!(result, Err(SettlementError::InvalidAmount { .. })));
    }

    #[test]
    fn test_purchase_with_balance_moves_funds() {
        let (mut conn, author, buyer) = setup();
        users::credit_earnings(&conn, buyer, Money::from_major(12_000)).expect("credit");
        let book = books::insert(
            &conn,
            author,
            "Book",
            ProductKind::EbookOnly,
            Money::from_major(10_000),
            None,
            1,
        )
        .expect("book");

        let event = PaymentEvent {
            payment_id: "bal-1".into(),
            gross_amount: Money::from_major(10_000),
            kind: ProductKind::EbookOnly,
            custom_rate: None,
            recipient: author,
            payer: buyer,
            referrer: None,
            book_id: Some(book),
        };
        let outcome = purchase_with_balance(&mut conn, &event, 100).expect("purchase");

        assert_eq!(outcome.result.recipient_net, Money::from_major(9_000));
        assert_eq!(
            users::earnings_balance(&conn, buyer).expect("balance"),
            Money::from_major(2_000)
        );
        assert_eq!(
            users::earnings_balance(&conn, author).expect("balance"),
            Money::from_major(9_000)
        );
    }

    #[test]
    fn test_purchase_with_balance_insufficient() {
        let (mut conn, author, buyer) = setup();
        users::credit_earnings(&conn, buyer, Money::from_major(1_000)).expect("credit");
        let book = books::insert(
            &conn,
            author,
            "Book",
            ProductKind::EbookOnly,
            Money::from_major(10_000),
            None,
            1,
        )
        .expect("book");

        let event = PaymentEvent {
            payment_id: "bal-1".into(),
            gross_amount: Money::from_major(10_000),
            kind: ProductKind::EbookOnly,
            custom_rate: None,
            recipient: author,
            payer: buyer,
            referrer: None,
            book_id: Some(book),
        };
        let result = purchase_with_balance(&mut conn, &event, 100);
        assert!(matches!(
            result,
            Err(SettlementError::InsufficientBalance { .. })
        ));
        // Whole transaction rolled back: no payment row, balances intact.
        assert!(folio_db::queries::payments::get(&conn, "bal-1").is_err());
        assert_eq!(
            users::earnings_balance(&conn, buyer).expect("balance"),
            Money::from_major(1_000)
        );
        assert_eq!(
            users::earnings_balance(&conn, author).expect("balance"),
            Money::ZERO
        );
    }

    #[test]
    fn test_purchase_with_balance_is_idempotent() {
        let (mut conn, author, buyer) = setup();
        users::credit_earnings(&conn, buyer, Money::from_major(25_000)).expect("credit");
        let book = books::insert(
            &conn,
            author,
            "Book",
            ProductKind::EbookOnly,
            Money::from_major(10_000),
            None,
            1,
        )
        .expect("book");

        let event = PaymentEvent {
            payment_id: "bal-1".into(),
            gross_amount: Money::from_major(10_000),
            kind: ProductKind::EbookOnly,
            custom_rate: None,
            recipient: author,
            payer: buyer,
            referrer: None,
            book_id: Some(book),
        };
        purchase_with_balance(&mut conn, &event, 100).expect("first purchase");
        let result = purchase_with_balance(&mut conn, &event, 200);
        assert!(matches!(
            result,
            Err(SettlementError::AlreadySettled { .. })
        ));
        // The duplicate rolled back entirely, including its debit.
        assert_eq!(
            users::earnings_balance(&conn, buyer).expect("balance"),
            Money::from_major(15_000)
        );
        assert_eq!(
            users::earnings_balance(&conn, author).expect("balance"),
            Money::from_major(9_000)
        );
    }
}
