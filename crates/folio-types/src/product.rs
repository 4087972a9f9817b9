//! The payment-completion event and the settlement result.
//!
//! A [`PaymentEvent`] is produced by the payment-confirmation handlers
//! (gateway return/webhook, balance-debit purchase, donation completion)
//! once a payment is known to be complete. How the payment was authorized
//! is not the settlement engine's concern.

use serde::{Deserialize, Serialize};

use crate::{BookId, Money, Percent, UserId};

/// What was paid for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A book available as ebook only.
    EbookOnly,
    /// A book with a generated audiobook (higher platform cut).
    WithAudiobook,
    /// A direct donation to an author.
    Donation,
}

impl ProductKind {
    /// Stable string form used in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            ProductKind::EbookOnly => "ebook_only",
            ProductKind::WithAudiobook => "with_audiobook",
            ProductKind::Donation => "donation",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<ProductKind> {
        match s {
            "ebook_only" => Some(ProductKind::EbookOnly),
            "with_audiobook" => Some(ProductKind::WithAudiobook),
            "donation" => Some(ProductKind::Donation),
            _ => None,
        }
    }
}

/// A completed gross payment, ready for settlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Unique gateway/transaction reference. Settlement is exactly-once
    /// per payment id.
    pub payment_id: String,
    /// Amount paid by the payer.
    pub gross_amount: Money,
    pub kind: ProductKind,
    /// Per-book commission override. Takes priority over global settings.
    pub custom_rate: Option<Percent>,
    /// The author/creator owed the non-platform share.
    pub recipient: UserId,
    /// The purchaser or donor.
    pub payer: UserId,
    /// Who referred the payer, if anyone.
    pub referrer: Option<UserId>,
    /// The book purchased; `None` for donations.
    pub book_id: Option<BookId>,
}

/// The exact split of one settled payment.
///
/// Conservation holds for every settlement:
/// `platform_commission + referral_commission + advance_recouped +
/// recipient_net == gross`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub platform_commission: Money,
    /// Zero when there is no eligible referrer.
    pub referral_commission: Money,
    /// Total deducted across all advances touched by this settlement.
    pub advance_recouped: Money,
    /// What the recipient's balance was credited.
    pub recipient_net: Money,
}

impl SettlementResult {
    /// Sum of all four legs; equals the gross amount.
    pub fn total(&self) -> Option<Money> {
        self.platform_commission
            .checked_add(self.referral_commission)?
            .checked_add(self.advance_recouped)?
            .checked_add(self.recipient_net)
    }
}
