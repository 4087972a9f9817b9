//! Upfront advance query functions.
//!
//! Row-level state machine guards live in the `WHERE` clauses: a
//! transition only fires from the states it is legal from, and recoupment
//! can never push `amount_recouped` past `amount_requested`, even if two
//! settlements race on the same advance.

use folio_types::{AdvanceId, AdvanceStatus, BookId, Money, Percent, UserId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// A raw advance row.
#[derive(Clone, Debug)]
pub struct AdvanceRow {
    pub id: AdvanceId,
    pub author: UserId,
    /// Specific book, or `None` for "all books by this author".
    pub book: Option<BookId>,
    pub amount_requested: Money,
    pub amount_recouped: Money,
    pub repayment_rate: Percent,
    pub status: AdvanceStatus,
    pub created_at: u64,
    pub approved_at: Option<u64>,
    pub completed_at: Option<u64>,
}

impl AdvanceRow {
    /// Amount still to be recouped.
    pub fn remaining(&self) -> Money {
        self.amount_requested
            .checked_sub(self.amount_recouped)
            .unwrap_or(Money::ZERO)
    }
}

fn row_to_advance(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdvanceRow> {
    let status_text: String = row.get(6)?;
    let status = AdvanceStatus::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown advance status '{status_text}'").into(),
        )
    })?;
    Ok(AdvanceRow {
        id: row.get(0)?,
        author: row.get(1)?,
        book: row.get(2)?,
        amount_requested: Money::from_minor(row.get(3)?),
        amount_recouped: Money::from_minor(row.get(4)?),
        repayment_rate: Percent::from_bps(row.get(5)?).unwrap_or(Percent::ZERO),
        status,
        created_at: row.get::<_, i64>(7)? as u64,
        approved_at: row.get::<_, Option<i64>>(8)?.map(|t| t as u64),
        completed_at: row.get::<_, Option<i64>>(9)?.map(|t| t as u64),
    })
}

const SELECT_COLUMNS: &str = "id, author_id, book_id, amount_requested, amount_recouped,
     repayment_bps, status, created_at, approved_at, completed_at";

/// Insert a new advance application in `in_review` state.
pub fn insert(
    conn: &Connection,
    author: UserId,
    book: Option<BookId>,
    amount_requested: Money,
    repayment_rate: Percent,
    reason: &str,
    created_at: u64,
) -> Result<AdvanceId> {
    conn.execute(
        "INSERT INTO upfront_advances
         (author_id, book_id, amount_requested, repayment_bps, reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            author,
            book,
            amount_requested.minor(),
            repayment_rate.bps(),
            reason,
            created_at as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch one advance by id.
pub fn get(conn: &Connection, id: AdvanceId) -> Result<AdvanceRow> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM upfront_advances WHERE id = ?1"),
        [id],
        row_to_advance,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("advance {id}")),
        other => DbError::Sqlite(other),
    })
}

/// Approved advances for an author that apply to a sale of `book`,
/// oldest application first.
///
/// An advance applies if it is scoped to this exact book or to all of the
/// author's books (`book_id IS NULL`). A sale with no book of its own
/// (`book` is `None`) only matches the all-books advances. The FIFO order
/// is an explicit sort key, not insertion order.
pub fn approved_fifo(
    conn: &Connection,
    author: UserId,
    book: Option<BookId>,
) -> Result<Vec<AdvanceRow>> {
    // With ?2 NULL the `book_id = ?2` arm never matches, leaving only the
    // all-books rows.
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM upfront_advances
         WHERE author_id = ?1 AND status = ?3
           AND (book_id IS NULL OR book_id = ?2)
         ORDER BY created_at, id"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![author, book, AdvanceStatus::Approved.as_str()],
            row_to_advance,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Approve an in-review advance, fixing its repayment rate.
pub fn approve(
    conn: &Connection,
    id: AdvanceId,
    repayment_rate: Percent,
    approved_at: u64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE upfront_advances
         SET status = ?1, repayment_bps = ?2, approved_at = ?3
         WHERE id = ?4 AND status = ?5",
        rusqlite::params![
            AdvanceStatus::Approved.as_str(),
            repayment_rate.bps(),
            approved_at as i64,
            id,
            AdvanceStatus::InReview.as_str(),
        ],
    )?;
    transition_result(conn, id, updated, "approve")
}

/// Reject an in-review advance.
pub fn reject(conn: &Connection, id: AdvanceId, rejection_reason: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE upfront_advances
         SET status = ?1, rejection_reason = ?2
         WHERE id = ?3 AND status = ?4",
        rusqlite::params![
            AdvanceStatus::Rejected.as_str(),
            rejection_reason,
            id,
            AdvanceStatus::InReview.as_str(),
        ],
    )?;
    transition_result(conn, id, updated, "reject")
}

/// Cancel an advance that has not started or finished recoupment.
pub fn cancel(conn: &Connection, id: AdvanceId) -> Result<()> {
    let updated = conn.execute(
        "UPDATE upfront_advances
         SET status = ?1
         WHERE id = ?2 AND status IN (?3, ?4)",
        rusqlite::params![
            AdvanceStatus::Cancelled.as_str(),
            id,
            AdvanceStatus::InReview.as_str(),
            AdvanceStatus::Approved.as_str(),
        ],
    )?;
    transition_result(conn, id, updated, "cancel")
}

fn transition_result(conn: &Connection, id: AdvanceId, updated: usize, verb: &str) -> Result<()> {
    if updated == 0 {
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM upfront_advances WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(DbError::Sqlite(other)),
            })?;
        return Err(match status {
            None => DbError::NotFound(format!("advance {id}")),
            Some(s) => DbError::Constraint(format!("cannot {verb} advance {id} in state '{s}'")),
        });
    }
    Ok(())
}

/// Apply one recoupment deduction to an approved advance.
///
/// Marks the advance `completed` in the same statement when the deduction
/// reaches `amount_requested`. The guard clause refuses a deduction past
/// the remaining amount, so a concurrent settlement cannot double-deduct.
/// Returns the updated row.
pub fn record_recoupment(
    conn: &Connection,
    id: AdvanceId,
    deduction: Money,
    now: u64,
) -> Result<AdvanceRow> {
    if deduction.is_negative() {
        return Err(DbError::Constraint(format!(
            "recoupment deduction must be non-negative, got {deduction}"
        )));
    }
    let updated = conn.execute(
        "UPDATE upfront_advances
         SET amount_recouped = amount_recouped + ?1,
             status = CASE WHEN amount_recouped + ?1 >= amount_requested
                           THEN ?4 ELSE status END,
             completed_at = CASE WHEN amount_recouped + ?1 >= amount_requested
                                 THEN ?2 ELSE completed_at END
         WHERE id = ?3 AND status = ?5
           AND amount_recouped + ?1 <= amount_requested",
        rusqlite::params![
            deduction.minor(),
            now as i64,
            id,
            AdvanceStatus::Completed.as_str(),
            AdvanceStatus::Approved.as_str(),
        ],
    )?;
    if updated == 0 {
        return Err(DbError::Constraint(format!(
            "advance {id} not approved or deduction {deduction} exceeds remaining"
        )));
    }
    get(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn test_author(conn: &Connection) -> UserId {
        users::insert(conn, "author@example.com", "Author", None, 1).expect("user")
    }

    fn rate(pct: i64) -> Percent {
        Percent::from_whole(pct).expect("valid rate")
    }

    #[test]
    fn test_insert_starts_in_review() {
        let conn = test_db();
        let author = test_author(&conn);
        let id = insert(
            &conn,
            author,
            None,
            Money::from_major(50_000),
            rate(20),
            "printing costs",
            100,
        )
        .expect("insert");
        let row = get(&conn, id).expect("get");
        assert_eq!(row.status, AdvanceStatus::InReview);
        assert_eq!(row.amount_recouped, Money::ZERO);
        assert_eq!(row.remaining(), Money::from_major(50_000));
    }

    #[test]
    fn test_approve_then_cancel() {
        let conn = test_db();
        let author = test_author(&conn);
        let id = insert(&conn, author, None, Money::from_major(10_000), rate(20), "", 100)
            .expect("insert");
        approve(&conn, id, rate(25), 200).expect("approve");
        let row = get(&conn, id).expect("get");
        assert_eq!(row.status, AdvanceStatus::Approved);
        assert_eq!(row.repayment_rate, rate(25));
        assert_eq!(row.approved_at, Some(200));

        cancel(&conn, id).expect("cancel");
        assert_eq!(get(&conn, id).expect("get").status, AdvanceStatus::Cancelled);
    }

    #[test]
    fn test_invalid_transitions() {
        let conn = test_db();
        let author = test_author(&conn);
        let id = insert(&conn, author, None, Money::from_major(10_000), rate(20), "", 100)
            .expect("insert");
        reject(&conn, id, "no sales history").expect("reject");
        assert!(get(&conn, id).expect("get").status.is_terminal());

        // Terminal: cannot approve, cancel, or re-reject.
        assert!(matches!(
            approve(&conn, id, rate(20), 300),
            Err(DbError::Constraint(_))
        ));
        assert!(matches!(cancel(&conn, id), Err(DbError::Constraint(_))));
        assert!(matches!(
            reject(&conn, id, "again"),
            Err(DbError::Constraint(_))
        ));

        assert!(matches!(
            approve(&conn, 999, rate(20), 300),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_recoupment_accumulates_and_completes() {
        let conn = test_db();
        let author = test_author(&conn);
        let id = insert(&conn, author, None, Money::from_major(1_500), rate(20), "", 100)
            .expect("insert");
        approve(&conn, id, rate(20), 200).expect("approve");

        let row = record_recoupment(&conn, id, Money::from_major(1_400), 300).expect("recoup");
        assert_eq!(row.status, AdvanceStatus::Approved);
        assert_eq!(row.remaining(), Money::from_major(100));

        let row = record_recoupment(&conn, id, Money::from_major(100), 400).expect("recoup");
        assert_eq!(row.status, AdvanceStatus::Completed);
        assert_eq!(row.completed_at, Some(400));
        assert_eq!(row.remaining(), Money::ZERO);

        // Completed is terminal: no further deductions.
        assert!(record_recoupment(&conn, id, Money::from_major(1), 500).is_err());
    }

    #[test]
    fn test_recoupment_cannot_exceed_remaining() {
        let conn = test_db();
        let author = test_author(&conn);
        let id = insert(&conn, author, None, Money::from_major(1_000), rate(20), "", 100)
            .expect("insert");
        approve(&conn, id, rate(20), 200).expect("approve");

        let result = record_recoupment(&conn, id, Money::from_major(1_001), 300);
        assert!(matches!(result, Err(DbError::Constraint(_))));
        assert_eq!(get(&conn, id).expect("get").amount_recouped, Money::ZERO);
    }

    #[test]
    fn test_approved_fifo_scope_and_order() {
        let conn = test_db();
        let author = test_author(&conn);
        let other = users::insert(&conn, "other@example.com", "Other", None, 1).expect("user");
        let book_a = crate::queries::books::insert(
            &conn,
            author,
            "A",
            folio_types::ProductKind::EbookOnly,
            Money::from_major(5_000),
            None,
            1,
        )
        .expect("book");
        let book_b = crate::queries::books::insert(
            &conn,
            author,
            "B",
            folio_types::ProductKind::EbookOnly,
            Money::from_major(5_000),
            None,
            1,
        )
        .expect("book");

        // Oldest first: all-books advance, then book-specific, then one
        // for another book, one still in review, and one for another author.
        let all_books = insert(&conn, author, None, Money::from_major(5_000), rate(20), "", 100)
            .expect("insert");
        let for_a = insert(
            &conn,
            author,
            Some(book_a),
            Money::from_major(3_000),
            rate(10),
            "",
            200,
        )
        .expect("insert");
        let for_b = insert(
            &conn,
            author,
            Some(book_b),
            Money::from_major(3_000),
            rate(10),
            "",
            150,
        )
        .expect("insert");
        let unapproved = insert(&conn, author, None, Money::from_major(2_000), rate(20), "", 50)
            .expect("insert");
        let foreign = insert(&conn, other, None, Money::from_major(2_000), rate(20), "", 10)
            .expect("insert");

        approve(&conn, all_books, rate(20), 300).expect("approve");
        approve(&conn, for_a, rate(10), 300).expect("approve");
        approve(&conn, for_b, rate(10), 300).expect("approve");
        approve(&conn, foreign, rate(20), 300).expect("approve");
        let _ = unapproved;

        let matched = approved_fifo(&conn, author, Some(book_a)).expect("query");
        let ids: Vec<_> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![all_books, for_a]);

        // No book: only the all-books advances apply.
        let matched = approved_fifo(&conn, author, None).expect("query");
        let ids: Vec<_> = matched.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![all_books]);
    }
}
