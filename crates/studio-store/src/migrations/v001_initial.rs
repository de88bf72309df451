//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `accounts`, `listings`, `bookings` and
//! `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,        -- lower-cased
    password_hash TEXT NOT NULL,               -- argon2id PHC string
    role          TEXT NOT NULL,               -- CLIENT | LISTING_OWNER | ADMIN
    avatar        TEXT,
    created_at    TEXT NOT NULL                -- RFC-3339, nanoseconds, UTC
);

-- ----------------------------------------------------------------
-- Listings (studios)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS listings (
    id          TEXT PRIMARY KEY NOT NULL,
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    location    TEXT NOT NULL,
    hourly_rate REAL NOT NULL CHECK (hourly_rate > 0),
    images      TEXT NOT NULL DEFAULT '[]',    -- JSON array of URLs
    features    TEXT NOT NULL DEFAULT '[]',    -- JSON array of labels
    visibility  TEXT NOT NULL DEFAULT 'PENDING',
    rating      REAL NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_listings_owner ON listings(owner_id);
CREATE INDEX IF NOT EXISTS idx_listings_visibility ON listings(visibility);

-- ----------------------------------------------------------------
-- Bookings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS bookings (
    id             TEXT PRIMARY KEY NOT NULL,
    listing_id     TEXT NOT NULL,
    user_id        TEXT,                       -- NULL for guest bookings
    guest_name     TEXT,
    start_at       TEXT NOT NULL,
    end_at         TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'PENDING',
    total_price    REAL NOT NULL CHECK (total_price >= 0),
    price_source   TEXT NOT NULL,              -- COMPUTED | CALLER_SUPPLIED
    message        TEXT,
    payment_method TEXT,
    payer_phone    TEXT,
    created_at     TEXT NOT NULL,

    CHECK (start_at < end_at),
    CHECK (user_id IS NOT NULL OR guest_name IS NOT NULL),
    FOREIGN KEY (listing_id) REFERENCES listings(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_bookings_listing ON bookings(listing_id);
CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,
    sender_id   TEXT,                          -- NULL for guest senders
    receiver_id TEXT NOT NULL,
    guest_name  TEXT,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL,

    FOREIGN KEY (sender_id) REFERENCES accounts(id),
    FOREIGN KEY (receiver_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_messages_receiver_ts ON messages(receiver_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_sender_ts ON messages(sender_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
