//! Platform schema and seed data
//!
//! Single SQLite dialect for every local engine; the HTTP surface
//! proxies the same facade, so remote callers see the same shapes.
//! Tables:
//! - users(name, email, password, role, location, organization, avatar)
//! - sectors(name, type, contact, region, description)
//! - events(name, start_date, end_date, location, sector_id, created_by)
//! - forums(title, sector, description, created_by) / forum_posts
//! - resources(title, category, link | file_name+file_blob, file_type)
//! - sector_connections(user_id, sector_id, status, notes)
//! - notifications(user_id | NULL broadcast, title, message, level)
//! - content(title, body, tags, audience, author_id, published_at)

use crate::Result;
use rusqlite::Connection;

/// Bcrypt work factor for seeded and newly created accounts
pub const HASH_COST: u32 = 10;

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'farmer',
    location TEXT,
    organization TEXT,
    avatar TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the sectors table
pub const CREATE_SECTORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sectors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    contact TEXT,
    region TEXT,
    description TEXT
)
"#;

/// SQL to create the events table
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    start_date TEXT NOT NULL,
    end_date TEXT,
    location TEXT,
    sector_id INTEGER,
    created_by INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the forums table
pub const CREATE_FORUMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS forums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    sector TEXT,
    description TEXT,
    created_by INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the forum_posts table
pub const CREATE_FORUM_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS forum_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    forum_id INTEGER NOT NULL,
    author_id INTEGER NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the resources table
pub const CREATE_RESOURCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    link TEXT,
    file_name TEXT,
    file_blob TEXT,
    file_type TEXT NOT NULL DEFAULT 'document',
    created_by INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the sector_connections table
pub const CREATE_SECTOR_CONNECTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sector_connections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    sector_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the notifications table
pub const CREATE_NOTIFICATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    level TEXT NOT NULL DEFAULT 'info',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create the content table
pub const CREATE_CONTENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    tags TEXT,
    audience TEXT,
    author_id INTEGER,
    published_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
    "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
    "CREATE INDEX IF NOT EXISTS idx_events_sector ON events(sector_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_date)",
    "CREATE INDEX IF NOT EXISTS idx_forum_posts_forum ON forum_posts(forum_id)",
    "CREATE INDEX IF NOT EXISTS idx_resources_category ON resources(category)",
    "CREATE INDEX IF NOT EXISTS idx_connections_user ON sector_connections(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_connections_sector ON sector_connections(sector_id)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_USERS_TABLE,
        CREATE_SECTORS_TABLE,
        CREATE_EVENTS_TABLE,
        CREATE_FORUMS_TABLE,
        CREATE_FORUM_POSTS_TABLE,
        CREATE_RESOURCES_TABLE,
        CREATE_SECTOR_CONNECTIONS_TABLE,
        CREATE_NOTIFICATIONS_TABLE,
        CREATE_CONTENT_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// Demo accounts seeded at bootstrap. The shared password keeps the
/// local demo loginable; hashes are computed per bootstrap, never
/// stored in source.
pub const SEED_USER_PASSWORD: &str = "demo1234";

const SEED_USERS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Asha Verma",
        "asha@agriconnect.in",
        "admin",
        "New Delhi",
        "AgriConnect",
    ),
    (
        "Ravi Kumar",
        "ravi@agriconnect.in",
        "farmer",
        "Pune",
        "Kumar Farms",
    ),
    (
        "Meera Patel",
        "meera@agriconnect.in",
        "expert",
        "Ahmedabad",
        "Gujarat Agricultural University",
    ),
    (
        "Arjun Singh",
        "arjun@agriconnect.in",
        "public",
        "Jaipur",
        "",
    ),
];

/// Seed statements for everything except users
pub const SEED_SQL: &str = r#"
INSERT INTO sectors (name, type, contact, region, description) VALUES
    ('AgroBank', 'Finance', 'contact@agrobank.com', 'National', 'Micro-financing and crop insurance services'),
    ('Harvest Logistics', 'Logistics', 'support@harvestlogistics.com', 'North India', 'Cold chain and transportation partners'),
    ('Seed Innovators', 'Technology', 'hello@seedinnovators.com', 'West India', 'R&D for climate resilient seeds');

INSERT INTO events (name, description, start_date, end_date, location, sector_id, created_by, created_at) VALUES
    ('Organic Farming Workshop', 'Learn organic farming techniques from experts', '2024-02-15T09:00:00Z', '2024-02-15T17:00:00Z', 'Community Center, Pune', 1, 2, '2024-01-20T11:00:00Z'),
    ('Financial Literacy Camp', 'Understanding loans and insurance for farmers', '2024-02-20T10:00:00Z', '2024-02-20T16:00:00Z', 'District Hall, Nashik', 1, 3, '2024-01-18T13:30:00Z');

INSERT INTO forums (title, sector, description, created_by, created_at) VALUES
    ('Pest Control Discussion', 'Technology', 'Share experiences with organic pest control methods', 2, '2024-01-12T08:00:00Z'),
    ('Water Conservation Techniques', 'Technology', 'Discuss efficient water usage in agriculture', 3, '2024-01-11T16:45:00Z');

INSERT INTO forum_posts (forum_id, author_id, body, created_at) VALUES
    (1, 3, 'Neem oil spray has worked well against aphids on my plots.', '2024-01-13T09:20:00Z'),
    (1, 2, 'How often do you reapply after rain?', '2024-01-13T11:05:00Z'),
    (2, 2, 'Switching to drip irrigation cut my water use by a third.', '2024-01-14T07:40:00Z');

INSERT INTO resources (title, category, description, link, file_name, file_blob, file_type, created_by, created_at) VALUES
    ('Organic Farming Guide', 'Guides', 'Complete guide to organic farming practices', 'https://example.com/organic-guide', NULL, NULL, 'document', 2, '2024-01-15T10:00:00Z'),
    ('Crop Insurance Schemes', 'Finance', 'Government crop insurance schemes explained', NULL, 'insurance_schemes.pdf', NULL, 'document', 2, '2024-01-10T14:30:00Z'),
    ('Drip Irrigation Manual', 'Technology', 'Installation and maintenance guide for drip irrigation', 'https://example.com/drip-irrigation', NULL, NULL, 'document', 3, '2024-01-08T09:15:00Z');

INSERT INTO sector_connections (user_id, sector_id, status, notes, created_at) VALUES
    (2, 1, 'active', 'Regular customer for crop insurance', '2024-01-05T12:00:00Z'),
    (2, 2, 'pending', 'Interested in cold storage facilities', '2024-01-22T15:30:00Z');

INSERT INTO notifications (user_id, title, message, level, created_at) VALUES
    (NULL, 'New Government Scheme', 'PM Kisan Samman Nidhi next installment released', 'info', '2024-01-25T10:30:00Z'),
    (2, 'Workshop Reminder', 'Organic farming workshop tomorrow at 9 AM', 'reminder', '2024-02-14T18:00:00Z');

INSERT INTO content (title, body, tags, audience, author_id, published_at) VALUES
    ('Monsoon Sowing Calendar', 'Recommended sowing windows for kharif crops across regions.', 'kharif,calendar', 'public', 3, '2024-01-02T06:00:00Z'),
    ('Soil Health Card Basics', 'How to read your soil health card and act on it.', 'soil,guides', 'farmer', 3, '2024-01-06T06:00:00Z');
"#;

/// Create every table and index on the given connection
pub fn create_schema(conn: &Connection) -> Result<()> {
    for stmt in all_schema_statements() {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

/// Load the fixed seed rows, hashing demo account passwords at call
/// time so no credential material lives in the schema text.
pub fn load_seed(conn: &Connection) -> Result<()> {
    conn.execute_batch(SEED_SQL)?;
    let hash = bcrypt::hash(SEED_USER_PASSWORD, HASH_COST)?;
    for (name, email, role, location, organization) in SEED_USERS {
        let organization = (!organization.is_empty()).then_some(*organization);
        conn.execute(
            "INSERT INTO users (name, email, password, role, location, organization) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![name, email, hash, role, location, organization],
        )?;
    }
    Ok(())
}

/// Schema + seed in one pass (fresh engines)
pub fn bootstrap(conn: &Connection) -> Result<()> {
    create_schema(conn)?;
    load_seed(conn)?;
    Ok(())
}

/// True when the schema has already been created (the users table is
/// the bootstrap sentinel, as in the original deployment)
pub fn is_bootstrapped(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
