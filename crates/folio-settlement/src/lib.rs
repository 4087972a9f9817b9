//! # folio-settlement
//!
//! The commission and earnings settlement engine. Given a completed
//! payment (book purchase or donation), it deterministically computes how
//! much flows to the platform, the author, a referrer, and any outstanding
//! upfront advances, and applies the whole split in one database
//! transaction.
//!
//! ## Modules
//!
//! - [`rates`] — effective commission rate resolution
//! - [`engine`] — the settlement transaction itself
//! - [`advance`] — upfront advance lifecycle and recoupment math
//! - [`balance`] — payout requests and purchase-from-balance

pub mod advance;
pub mod balance;
pub mod engine;
pub mod rates;

pub use engine::{settle, SettlementOutcome};

use folio_types::{Money, Percent, UserId};

/// Error types for settlement operations.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// The payment was already settled; the call was a no-op.
    #[error("payment '{payment_id}' already settled")]
    AlreadySettled {
        /// The duplicate payment id.
        payment_id: String,
    },

    /// Gross amount is negative or otherwise unusable.
    #[error("invalid gross amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Money,
    },

    /// Advance request below the platform minimum.
    #[error("advance request {amount} is below the minimum {minimum}")]
    AdvanceBelowMinimum {
        /// The requested amount.
        amount: Money,
        /// The platform minimum.
        minimum: Money,
    },

    /// Repayment rate outside the allowed range.
    #[error("repayment rate {rate} exceeds the maximum {maximum}")]
    RepaymentRateTooHigh {
        /// The rejected rate.
        rate: Percent,
        /// The allowed maximum.
        maximum: Percent,
    },

    /// A balance debit could not be covered.
    #[error("insufficient balance for user {user}: need {needed}")]
    InsufficientBalance {
        /// The debited user.
        user: UserId,
        /// The amount that was needed.
        needed: Money,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in settlement calculation")]
    Overflow,

    /// Underlying database failure.
    #[error("database error: {0}")]
    Db(#[from] folio_db::DbError),
}

/// Convenience result type for settlement operations.
pub type Result<T> = std::result::Result<T, SettlementError>;
