//! Domain events emitted by the settlement engine.
//!
//! The engine returns these alongside the [`SettlementResult`] instead of
//! firing notifications from inside the transaction. The caller routes them
//! to whatever notification infrastructure it owns, so settlement stays
//! pure and testable.
//!
//! [`SettlementResult`]: crate::SettlementResult

use serde::{Deserialize, Serialize};

use crate::{AdvanceId, Money, UserId};

/// A discrete effect of one settlement, for the caller to act on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SettlementEvent {
    /// The recipient's balance was credited with their net share.
    RecipientCredited { user: UserId, amount: Money },
    /// A referrer earned a referral commission.
    ReferralCredited { user: UserId, amount: Money },
    /// An advance was partially recouped from this sale.
    AdvanceRecouped {
        advance: AdvanceId,
        amount: Money,
        remaining: Money,
    },
    /// An advance reached full recoupment and is now terminal.
    AdvanceCompleted { advance: AdvanceId },
}
