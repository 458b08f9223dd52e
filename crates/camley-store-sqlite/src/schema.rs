//! SQL schema for the Camley SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    phone         TEXT,
    address       TEXT,
    gender        TEXT,
    role          TEXT NOT NULL,            -- 'admin' | 'parent' | 'driver'
    active        INTEGER NOT NULL DEFAULT 0,
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id          TEXT PRIMARY KEY,
    plate               TEXT NOT NULL UNIQUE,
    brand               TEXT,
    model               TEXT,
    year                INTEGER,
    capacity            INTEGER,
    color               TEXT,
    status              TEXT NOT NULL DEFAULT 'active',
    driver_id           TEXT REFERENCES accounts(account_id) ON DELETE SET NULL,
    mileage             INTEGER,
    last_maintenance_at TEXT,
    notes               TEXT
);

CREATE TABLE IF NOT EXISTS routes (
    route_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    starts_at   TEXT NOT NULL,              -- HH:MM
    ends_at     TEXT NOT NULL,              -- HH:MM
    driver_id   TEXT REFERENCES accounts(account_id) ON DELETE SET NULL,
    vehicle_id  TEXT REFERENCES vehicles(vehicle_id) ON DELETE SET NULL,
    active      INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS students (
    student_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    age         INTEGER,
    gender      TEXT NOT NULL,
    grade       TEXT NOT NULL,
    school      TEXT NOT NULL,
    condition   TEXT,
    parent_id   TEXT REFERENCES accounts(account_id) ON DELETE SET NULL,
    route_id    TEXT REFERENCES routes(route_id) ON DELETE SET NULL,
    active      INTEGER NOT NULL DEFAULT 1,
    enrolled_at TEXT NOT NULL
);

-- Amounts are decimal strings; timestamps fixed-width RFC 3339 UTC so that
-- text comparison orders them.
CREATE TABLE IF NOT EXISTS payments (
    payment_id     TEXT PRIMARY KEY,
    student_id     TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    amount         TEXT NOT NULL,
    status         TEXT NOT NULL,           -- 'pending' | 'paid'
    due_at         TEXT NOT NULL,
    paid_at        TEXT,
    created_at     TEXT NOT NULL,
    months_covered INTEGER NOT NULL DEFAULT 1,
    method         TEXT,
    reference      TEXT,
    description    TEXT,
    seen_by_parent INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS incomes (
    income_id   TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    amount      TEXT NOT NULL,
    source      TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    payment_id  TEXT REFERENCES payments(payment_id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    expense_id  TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    amount      TEXT NOT NULL,
    category    TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    receipt     TEXT
);

CREATE TABLE IF NOT EXISTS attendance (
    attendance_id TEXT PRIMARY KEY,
    student_id    TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    date          TEXT NOT NULL,            -- YYYY-MM-DD
    time          TEXT NOT NULL,            -- HH:MM:SS
    status        TEXT NOT NULL,
    observations  TEXT,
    driver_id     TEXT REFERENCES accounts(account_id) ON DELETE SET NULL,
    UNIQUE (student_id, date)
);

CREATE TABLE IF NOT EXISTS manual_attendance (
    summary_id TEXT PRIMARY KEY,
    driver_id  TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    date       TEXT NOT NULL,
    present    INTEGER NOT NULL DEFAULT 0,
    absent     INTEGER NOT NULL DEFAULT 0,
    notes      TEXT,
    UNIQUE (driver_id, date)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id    TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    message         TEXT NOT NULL,
    link            TEXT,
    created_at      TEXT NOT NULL,
    read            INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS push_subscriptions (
    endpoint   TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    p256dh     TEXT NOT NULL,
    auth       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    driver_id  TEXT PRIMARY KEY REFERENCES accounts(account_id) ON DELETE CASCADE,
    lat        REAL NOT NULL,
    lng        REAL NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS location_history (
    point_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    driver_id   TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    lat         REAL NOT NULL,
    lng         REAL NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id   TEXT PRIMARY KEY,
    sender_id   TEXT NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    sender_role TEXT NOT NULL,
    subject     TEXT NOT NULL,
    priority    TEXT NOT NULL,
    message     TEXT NOT NULL,
    opened_at   TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'open',
    answer      TEXT,
    answered_by TEXT REFERENCES accounts(account_id) ON DELETE SET NULL,
    answered_at TEXT,
    driver_id   TEXT REFERENCES accounts(account_id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS payments_student_idx   ON payments(student_id);
CREATE INDEX IF NOT EXISTS payments_status_idx    ON payments(status, due_at);
CREATE INDEX IF NOT EXISTS incomes_dedupe_idx     ON incomes(description, amount, source, recorded_at);
CREATE INDEX IF NOT EXISTS attendance_date_idx    ON attendance(date);
CREATE INDEX IF NOT EXISTS notifications_recv_idx ON notifications(recipient_id, created_at);
CREATE INDEX IF NOT EXISTS history_driver_idx     ON location_history(driver_id, point_id);

PRAGMA user_version = 1;
";
