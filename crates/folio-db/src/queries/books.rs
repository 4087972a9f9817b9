//! Book query functions.

use folio_types::{BookId, Money, Percent, ProductKind, UserId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Insert a book, returning the new id.
pub fn insert(
    conn: &Connection,
    author: UserId,
    title: &str,
    kind: ProductKind,
    price: Money,
    custom_rate: Option<Percent>,
    created_at: u64,
) -> Result<BookId> {
    conn.execute(
        "INSERT INTO books (author_id, title, kind, price, custom_rate_bps, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            author,
            title,
            kind.as_str(),
            price.minor(),
            custom_rate.map(Percent::bps),
            created_at as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Set or clear a book's custom commission rate.
pub fn set_custom_rate(conn: &Connection, book: BookId, rate: Option<Percent>) -> Result<()> {
    let updated = conn.execute(
        "UPDATE books SET custom_rate_bps = ?1 WHERE id = ?2",
        rusqlite::params![rate.map(Percent::bps), book],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("book {book}")));
    }
    Ok(())
}

/// Get a book's author id.
pub fn author(conn: &Connection, book: BookId) -> Result<UserId> {
    conn.query_row("SELECT author_id FROM books WHERE id = ?1", [book], |row| {
        row.get(0)
    })
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("book {book}")),
        other => DbError::Sqlite(other),
    })
}
