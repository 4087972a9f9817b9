//! Commission and referral settings query functions.
//!
//! Both settings tables are singletons: `id INTEGER PRIMARY KEY CHECK
//! (id = 1)`, seeded by the initial migration. Attempting to insert a
//! second row violates the CHECK constraint and is rejected by SQLite.
//! The settlement engine reads a snapshot per call; a rate change only
//! affects settlements that start after it commits.

use folio_types::{Percent, ProductKind};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Snapshot of the global commission rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommissionSettings {
    pub ebook: Percent,
    pub audiobook: Percent,
    pub donation: Percent,
}

impl CommissionSettings {
    /// The global rate for a product kind, ignoring per-book overrides.
    pub fn rate_for(&self, kind: ProductKind) -> Percent {
        match kind {
            ProductKind::EbookOnly => self.ebook,
            ProductKind::WithAudiobook => self.audiobook,
            ProductKind::Donation => self.donation,
        }
    }
}

/// Snapshot of the referral settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReferralSettings {
    pub percent: Percent,
    pub is_active: bool,
}

impl ReferralSettings {
    /// The percent actually applied: zero while the system is disabled.
    pub fn effective_percent(&self) -> Percent {
        if self.is_active {
            self.percent
        } else {
            Percent::ZERO
        }
    }
}

fn percent_from_db(bps: i64) -> Result<Percent> {
    Percent::from_bps(bps).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Load the commission settings singleton.
pub fn commission(conn: &Connection) -> Result<CommissionSettings> {
    let (ebook, audiobook, donation): (i64, i64, i64) = conn
        .query_row(
            "SELECT ebook_bps, audiobook_bps, donation_bps
             FROM commission_settings WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound("commission settings singleton".into())
            }
            other => DbError::Sqlite(other),
        })?;
    Ok(CommissionSettings {
        ebook: percent_from_db(ebook)?,
        audiobook: percent_from_db(audiobook)?,
        donation: percent_from_db(donation)?,
    })
}

/// Update the commission settings singleton.
pub fn set_commission(
    conn: &Connection,
    settings: &CommissionSettings,
    updated_at: u64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE commission_settings
         SET ebook_bps = ?1, audiobook_bps = ?2, donation_bps = ?3, updated_at = ?4
         WHERE id = 1",
        rusqlite::params![
            settings.ebook.bps(),
            settings.audiobook.bps(),
            settings.donation.bps(),
            updated_at as i64,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("commission settings singleton".into()));
    }
    tracing::info!(
        ebook = %settings.ebook,
        audiobook = %settings.audiobook,
        donation = %settings.donation,
        "commission rates updated"
    );
    Ok(())
}

/// Load the referral settings singleton.
pub fn referral(conn: &Connection) -> Result<ReferralSettings> {
    let (percent, is_active): (i64, i64) = conn
        .query_row(
            "SELECT percent_bps, is_active FROM referral_settings WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound("referral settings singleton".into())
            }
            other => DbError::Sqlite(other),
        })?;
    Ok(ReferralSettings {
        percent: percent_from_db(percent)?,
        is_active: is_active != 0,
    })
}

/// Update the referral settings singleton.
pub fn set_referral(
    conn: &Connection,
    percent: Percent,
    is_active: bool,
    updated_at: u64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE referral_settings
         SET percent_bps = ?1, is_active = ?2, updated_at = ?3
         WHERE id = 1",
        rusqlite::params![percent.bps(), is_active, updated_at as i64],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("referral settings singleton".into()));
    }
    tracing::info!(percent = %percent, is_active, "referral settings updated");
    Ok(())
}
