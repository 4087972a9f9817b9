//! SQL schema definitions.

/// Complete schema for Folio v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Users & books
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    referral_code TEXT UNIQUE,
    earnings_balance INTEGER NOT NULL DEFAULT 0 CHECK (earnings_balance >= 0),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY,
    author_id INTEGER NOT NULL REFERENCES users(id),
    title TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'ebook_only'
        CHECK (kind IN ('ebook_only', 'with_audiobook')),
    price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
    custom_rate_bps INTEGER
        CHECK (custom_rate_bps IS NULL OR custom_rate_bps BETWEEN 0 AND 10000),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);

-- ============================================================
-- Commission & referral settings (singletons)
-- ============================================================

CREATE TABLE IF NOT EXISTS commission_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    ebook_bps INTEGER NOT NULL CHECK (ebook_bps BETWEEN 0 AND 10000),
    audiobook_bps INTEGER NOT NULL CHECK (audiobook_bps BETWEEN 0 AND 10000),
    donation_bps INTEGER NOT NULL CHECK (donation_bps BETWEEN 0 AND 10000),
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS referral_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    percent_bps INTEGER NOT NULL CHECK (percent_bps BETWEEN 0 AND 10000),
    is_active INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER NOT NULL
);

-- ============================================================
-- Payments
-- ============================================================

CREATE TABLE IF NOT EXISTS payments (
    payment_id TEXT PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'settled', 'failed')),
    kind TEXT NOT NULL
        CHECK (kind IN ('ebook_only', 'with_audiobook', 'donation')),
    gross_amount INTEGER NOT NULL CHECK (gross_amount >= 0),
    payer_id INTEGER NOT NULL REFERENCES users(id),
    recipient_id INTEGER NOT NULL REFERENCES users(id),
    referrer_id INTEGER REFERENCES users(id),
    book_id INTEGER REFERENCES books(id),
    platform_commission INTEGER NOT NULL DEFAULT 0,
    referral_commission INTEGER NOT NULL DEFAULT 0,
    advance_recouped INTEGER NOT NULL DEFAULT 0,
    recipient_net INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    settled_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_payments_status ON payments(status);
CREATE INDEX IF NOT EXISTS idx_payments_recipient ON payments(recipient_id);

-- ============================================================
-- Upfront advances
-- ============================================================

CREATE TABLE IF NOT EXISTS upfront_advances (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id INTEGER NOT NULL REFERENCES users(id),
    book_id INTEGER REFERENCES books(id),
    amount_requested INTEGER NOT NULL CHECK (amount_requested > 0),
    amount_recouped INTEGER NOT NULL DEFAULT 0
        CHECK (amount_recouped >= 0 AND amount_recouped <= amount_requested),
    repayment_bps INTEGER NOT NULL DEFAULT 2000
        CHECK (repayment_bps BETWEEN 0 AND 5000),
    status TEXT NOT NULL DEFAULT 'in_review'
        CHECK (status IN ('in_review', 'approved', 'completed', 'rejected', 'cancelled')),
    reason TEXT NOT NULL DEFAULT '',
    rejection_reason TEXT,
    created_at INTEGER NOT NULL,
    approved_at INTEGER,
    completed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_advances_author_status
    ON upfront_advances(author_id, status);

-- ============================================================
-- Payout requests
-- ============================================================

CREATE TABLE IF NOT EXISTS payout_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    amount INTEGER NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'paid', 'denied')),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_payouts_user ON payout_requests(user_id);
"#;
