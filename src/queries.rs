//! Typed data operations for the platform entities
//!
//! The statements the dashboards issue, behind typed functions: list
//! views carry their display joins (author names, sector names, reply
//! counts), mutations go through the facade so the revision counter
//! invalidates every live view. Also hosts the dynamic statement
//! builders used by admin tooling.

use crate::model::{
    self, ConnectionStatus, ContentItem, Event, Forum, ForumPost, Notification, Resource, Sector,
    SectorConnection, User,
};
use crate::{Database, Result, Row, RunResult};
use serde_json::{Value, json};

fn decode<T: serde::de::DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(model::from_row).collect()
}

// ========== Users ==========

pub async fn list_users(db: &Database) -> Result<Vec<User>> {
    let rows = db
        .query("SELECT * FROM users ORDER BY created_at DESC", &[])
        .await?;
    decode(rows)
}

pub async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>> {
    let rows = db
        .query("SELECT * FROM users WHERE email = ?1", &[json!(email)])
        .await?;
    Ok(decode(rows)?.into_iter().next())
}

/// Insert an account row. `password` must already be a bcrypt hash;
/// plaintext never reaches a statement.
pub async fn insert_user(
    db: &Database,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    location: Option<&str>,
    organization: Option<&str>,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO users (name, email, password, role, location, organization) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        &[
            json!(name),
            json!(email),
            json!(password_hash),
            json!(role),
            json!(location),
            json!(organization),
        ],
    )
    .await
}

pub async fn update_user_profile(
    db: &Database,
    id: i64,
    name: &str,
    email: &str,
    location: Option<&str>,
    organization: Option<&str>,
    avatar: Option<&str>,
) -> Result<RunResult> {
    db.run(
        "UPDATE users SET name = ?1, email = ?2, location = ?3, organization = ?4, avatar = ?5 WHERE id = ?6",
        &[
            json!(name),
            json!(email),
            json!(location),
            json!(organization),
            json!(avatar),
            json!(id),
        ],
    )
    .await
}

pub async fn delete_user(db: &Database, id: i64) -> Result<RunResult> {
    db.run("DELETE FROM users WHERE id = ?1", &[json!(id)]).await
}

// ========== Sectors ==========

pub async fn list_sectors(db: &Database) -> Result<Vec<Sector>> {
    let rows = db
        .query("SELECT * FROM sectors ORDER BY name ASC", &[])
        .await?;
    decode(rows)
}

pub async fn insert_sector(
    db: &Database,
    name: &str,
    kind: &str,
    contact: Option<&str>,
    region: Option<&str>,
    description: Option<&str>,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO sectors (name, type, contact, region, description) VALUES (?1, ?2, ?3, ?4, ?5)",
        &[
            json!(name),
            json!(kind),
            json!(contact),
            json!(region),
            json!(description),
        ],
    )
    .await
}

// ========== Events ==========

pub async fn list_events(db: &Database) -> Result<Vec<Event>> {
    let rows = db
        .query(
            "SELECT events.*, sectors.name AS sector_name, users.name AS creator_name \
             FROM events \
             LEFT JOIN sectors ON sectors.id = events.sector_id \
             LEFT JOIN users ON users.id = events.created_by \
             ORDER BY start_date ASC",
            &[],
        )
        .await?;
    decode(rows)
}

pub async fn upcoming_events(db: &Database, limit: i64) -> Result<Vec<Event>> {
    let rows = db
        .query(
            "SELECT events.*, sectors.name AS sector_name \
             FROM events \
             LEFT JOIN sectors ON sectors.id = events.sector_id \
             ORDER BY start_date ASC LIMIT ?1",
            &[json!(limit)],
        )
        .await?;
    decode(rows)
}

pub async fn insert_event(
    db: &Database,
    name: &str,
    description: Option<&str>,
    start_date: &str,
    end_date: Option<&str>,
    location: Option<&str>,
    sector_id: Option<i64>,
    created_by: i64,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO events (name, description, start_date, end_date, location, sector_id, created_by) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        &[
            json!(name),
            json!(description),
            json!(start_date),
            json!(end_date),
            json!(location),
            json!(sector_id),
            json!(created_by),
        ],
    )
    .await
}

pub async fn delete_event(db: &Database, id: i64) -> Result<RunResult> {
    db.run("DELETE FROM events WHERE id = ?1", &[json!(id)]).await
}

// ========== Forums ==========

pub async fn list_forums(db: &Database) -> Result<Vec<Forum>> {
    let rows = db
        .query(
            "SELECT forums.*, users.name AS author_name, COUNT(forum_posts.id) AS replies \
             FROM forums \
             LEFT JOIN users ON users.id = forums.created_by \
             LEFT JOIN forum_posts ON forum_posts.forum_id = forums.id \
             GROUP BY forums.id \
             ORDER BY forums.created_at DESC",
            &[],
        )
        .await?;
    decode(rows)
}

pub async fn insert_forum(
    db: &Database,
    title: &str,
    description: Option<&str>,
    created_by: i64,
    sector: Option<&str>,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO forums (title, description, created_by, sector) VALUES (?1, ?2, ?3, ?4)",
        &[
            json!(title),
            json!(description),
            json!(created_by),
            json!(sector),
        ],
    )
    .await
}

pub async fn forum_posts(db: &Database, forum_id: i64) -> Result<Vec<ForumPost>> {
    let rows = db
        .query(
            "SELECT forum_posts.*, users.name AS author_name \
             FROM forum_posts \
             JOIN users ON users.id = forum_posts.author_id \
             WHERE forum_posts.forum_id = ?1 \
             ORDER BY forum_posts.created_at DESC",
            &[json!(forum_id)],
        )
        .await?;
    decode(rows)
}

pub async fn insert_forum_post(
    db: &Database,
    forum_id: i64,
    author_id: i64,
    body: &str,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO forum_posts (forum_id, author_id, body) VALUES (?1, ?2, ?3)",
        &[json!(forum_id), json!(author_id), json!(body)],
    )
    .await
}

// ========== Resources ==========

pub async fn list_resources(db: &Database) -> Result<Vec<Resource>> {
    let rows = db
        .query(
            "SELECT resources.*, users.name AS author_name \
             FROM resources \
             LEFT JOIN users ON users.id = resources.created_by \
             ORDER BY created_at DESC",
            &[],
        )
        .await?;
    decode(rows)
}

pub async fn resource_detail(db: &Database, id: i64) -> Result<Option<Resource>> {
    let rows = db
        .query(
            "SELECT resources.*, users.name AS author_name \
             FROM resources \
             LEFT JOIN users ON users.id = resources.created_by \
             WHERE resources.id = ?1",
            &[json!(id)],
        )
        .await?;
    Ok(decode(rows)?.into_iter().next())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_resource(
    db: &Database,
    title: &str,
    category: &str,
    description: Option<&str>,
    link: Option<&str>,
    file_name: Option<&str>,
    file_blob: Option<&str>,
    created_by: i64,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO resources (title, category, description, link, file_name, file_blob, created_by) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        &[
            json!(title),
            json!(category),
            json!(description),
            json!(link),
            json!(file_name),
            json!(file_blob),
            json!(created_by),
        ],
    )
    .await
}

pub async fn attach_resource_file(
    db: &Database,
    id: i64,
    file_name: &str,
    file_blob: &str,
    file_type: &str,
) -> Result<RunResult> {
    db.run(
        "UPDATE resources SET file_name = ?1, file_blob = ?2, file_type = ?3 WHERE id = ?4",
        &[
            json!(file_name),
            json!(file_blob),
            json!(file_type),
            json!(id),
        ],
    )
    .await
}

pub async fn delete_resource(db: &Database, id: i64) -> Result<RunResult> {
    db.run("DELETE FROM resources WHERE id = ?1", &[json!(id)])
        .await
}

// ========== Sector connections ==========

pub async fn list_connections(db: &Database) -> Result<Vec<SectorConnection>> {
    let rows = db
        .query(
            "SELECT sector_connections.*, users.name AS user_name, sectors.name AS sector_name, sectors.type AS sector_type \
             FROM sector_connections \
             JOIN users ON users.id = sector_connections.user_id \
             JOIN sectors ON sectors.id = sector_connections.sector_id \
             ORDER BY created_at DESC",
            &[],
        )
        .await?;
    decode(rows)
}

pub async fn connections_for_user(db: &Database, user_id: i64) -> Result<Vec<SectorConnection>> {
    let rows = db
        .query(
            "SELECT sector_connections.*, sectors.name AS sector_name, sectors.type AS sector_type \
             FROM sector_connections \
             JOIN sectors ON sectors.id = sector_connections.sector_id \
             WHERE user_id = ?1 ORDER BY created_at DESC",
            &[json!(user_id)],
        )
        .await?;
    decode(rows)
}

pub async fn insert_connection(
    db: &Database,
    user_id: i64,
    sector_id: i64,
    status: ConnectionStatus,
    notes: Option<&str>,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO sector_connections (user_id, sector_id, status, notes) VALUES (?1, ?2, ?3, ?4)",
        &[
            json!(user_id),
            json!(sector_id),
            json!(status.as_str()),
            json!(notes),
        ],
    )
    .await
}

pub async fn set_connection_status(
    db: &Database,
    id: i64,
    status: ConnectionStatus,
) -> Result<RunResult> {
    db.run(
        "UPDATE sector_connections SET status = ?1 WHERE id = ?2",
        &[json!(status.as_str()), json!(id)],
    )
    .await
}

// ========== Notifications ==========

pub async fn list_notifications(db: &Database) -> Result<Vec<Notification>> {
    let rows = db
        .query(
            "SELECT notifications.*, users.name AS user_name \
             FROM notifications \
             LEFT JOIN users ON users.id = notifications.user_id \
             ORDER BY created_at DESC",
            &[],
        )
        .await?;
    decode(rows)
}

/// Broadcasts (`user_id IS NULL`) plus the account's own notifications.
pub async fn notifications_for_user(
    db: &Database,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Notification>> {
    let rows = db
        .query(
            "SELECT * FROM notifications WHERE user_id IS NULL OR user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            &[json!(user_id), json!(limit)],
        )
        .await?;
    decode(rows)
}

pub async fn push_notification(
    db: &Database,
    user_id: Option<i64>,
    title: &str,
    message: &str,
    level: crate::NotificationLevel,
) -> Result<RunResult> {
    db.run(
        "INSERT INTO notifications (user_id, title, message, level) VALUES (?1, ?2, ?3, ?4)",
        &[
            json!(user_id),
            json!(title),
            json!(message),
            json!(level.as_str()),
        ],
    )
    .await
}

// ========== Public content ==========

pub async fn content_for_audience(db: &Database, audience: &str) -> Result<Vec<ContentItem>> {
    let rows = db
        .query(
            "SELECT content.*, users.name AS author_name \
             FROM content \
             LEFT JOIN users ON users.id = content.author_id \
             WHERE content.audience LIKE ?1 \
             ORDER BY published_at DESC",
            &[json!(audience)],
        )
        .await?;
    decode(rows)
}

// ========== Dynamic statement builders (admin tooling) ==========
//
// Identifiers are interpolated, not bound; callers supply fixed table
// and column names, never user input.

pub async fn select_all(db: &Database, table: &str) -> Result<Vec<Row>> {
    db.execute(&format!("SELECT * FROM {}", table), &[]).await
}

pub async fn insert_row(db: &Database, table: &str, payload: &Row) -> Result<RunResult> {
    let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
    let placeholders = vec!["?"; keys.len()];
    let values: Vec<Value> = payload.values().cloned().collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        keys.join(", "),
        placeholders.join(", ")
    );
    db.run(&sql, &values).await
}

pub async fn update_rows(
    db: &Database,
    table: &str,
    payload: &Row,
    where_clause: &str,
    params: &[Value],
) -> Result<RunResult> {
    let assignments: Vec<String> = payload
        .keys()
        .map(|key| format!("{} = ?", key))
        .collect();
    let mut values: Vec<Value> = payload.values().cloned().collect();
    values.extend_from_slice(params);
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        assignments.join(", "),
        where_clause
    );
    db.run(&sql, &values).await
}

pub async fn delete_rows(
    db: &Database,
    table: &str,
    where_clause: &str,
    params: &[Value],
) -> Result<RunResult> {
    let sql = format!("DELETE FROM {} WHERE {}", table, where_clause);
    db.run(&sql, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EphemeralBackend;

    fn demo_db() -> Database {
        Database::with_backend(Box::new(EphemeralBackend::new().unwrap()))
    }

    #[tokio::test]
    async fn test_sector_catalog_is_name_ordered() {
        let db = demo_db();
        let sectors = list_sectors(&db).await.unwrap();
        let names: Vec<&str> = sectors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["AgroBank", "Harvest Logistics", "Seed Innovators"]);
    }

    #[tokio::test]
    async fn test_events_carry_display_joins() {
        let db = demo_db();
        let events = list_events(&db).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sector_name.as_deref(), Some("AgroBank"));
        assert_eq!(events[0].creator_name.as_deref(), Some("Ravi Kumar"));
    }

    #[tokio::test]
    async fn test_insert_event_then_list() {
        let db = demo_db();
        let result = insert_event(
            &db,
            "Soil Testing Drive",
            Some("Free soil testing for members"),
            "2024-03-10T09:00:00Z",
            None,
            Some("Nashik"),
            Some(3),
            2,
        )
        .await
        .unwrap();
        assert_eq!(result.changes, 1);

        let events = list_events(&db).await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().any(|e| e.name == "Soil Testing Drive"));
    }

    #[tokio::test]
    async fn test_forum_reply_counts() {
        let db = demo_db();
        let forums = list_forums(&db).await.unwrap();
        let pest = forums
            .iter()
            .find(|f| f.title == "Pest Control Discussion")
            .unwrap();
        assert_eq!(pest.replies, Some(2));
        assert_eq!(pest.author_name.as_deref(), Some("Ravi Kumar"));

        let posts = forum_posts(&db, pest.id).await.unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_notifications_include_broadcasts() {
        let db = demo_db();
        // User 2 sees the broadcast plus their own reminder.
        let for_farmer = notifications_for_user(&db, 2, 10).await.unwrap();
        assert_eq!(for_farmer.len(), 2);

        // User 3 sees only the broadcast.
        let for_expert = notifications_for_user(&db, 3, 10).await.unwrap();
        assert_eq!(for_expert.len(), 1);
        assert!(for_expert[0].user_id.is_none());
    }

    #[tokio::test]
    async fn test_connection_views_join_names() {
        let db = demo_db();
        let all = list_connections(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|c| c.user_name.as_deref() == Some("Ravi Kumar")));

        let mine = connections_for_user(&db, 2).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].sector_name.as_deref(), Some("Harvest Logistics"));
    }

    #[tokio::test]
    async fn test_connection_status_update() {
        let db = demo_db();
        set_connection_status(&db, 2, ConnectionStatus::Approved)
            .await
            .unwrap();
        let mine = connections_for_user(&db, 2).await.unwrap();
        let updated = mine.iter().find(|c| c.id == 2).unwrap();
        assert_eq!(updated.status, ConnectionStatus::Approved);
    }

    #[tokio::test]
    async fn test_dynamic_builders_roundtrip() {
        let db = demo_db();
        let mut payload = Row::new();
        payload.insert("name".to_string(), serde_json::json!("Dynamic Co"));
        payload.insert("type".to_string(), serde_json::json!("Finance"));
        let result = insert_row(&db, "sectors", &payload).await.unwrap();
        assert_eq!(result.changes, 1);
        let id = result.last_insert_id.unwrap();

        let mut patch = Row::new();
        patch.insert("region".to_string(), serde_json::json!("South India"));
        update_rows(&db, "sectors", &patch, "id = ?", &[serde_json::json!(id)])
            .await
            .unwrap();

        let rows = select_all(&db, "sectors").await.unwrap();
        assert!(
            rows.iter()
                .any(|r| r["name"] == serde_json::json!("Dynamic Co")
                    && r["region"] == serde_json::json!("South India"))
        );

        delete_rows(&db, "sectors", "id = ?", &[serde_json::json!(id)])
            .await
            .unwrap();
        let rows = select_all(&db, "sectors").await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_user_admin_flow() {
        let db = demo_db();
        assert_eq!(list_users(&db).await.unwrap().len(), 4);

        insert_user(
            &db,
            "Kiran Rao",
            "kiran@agriconnect.in",
            "$2b$10$notarealhashbutstoredasis",
            "expert",
            Some("Mysuru"),
            None,
        )
        .await
        .unwrap();
        let users = list_users(&db).await.unwrap();
        assert_eq!(users.len(), 5);
        let kiran = users.iter().find(|u| u.name == "Kiran Rao").unwrap();

        update_user_profile(
            &db,
            kiran.id,
            "Kiran Rao",
            "kiran@agriconnect.in",
            Some("Bengaluru"),
            Some("AgroLabs"),
            None,
        )
        .await
        .unwrap();
        let refreshed = find_user_by_email(&db, "kiran@agriconnect.in")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.location.as_deref(), Some("Bengaluru"));

        // Deleting twice: first removes the row, second finds nothing.
        assert_eq!(delete_user(&db, kiran.id).await.unwrap().changes, 1);
        assert_eq!(delete_user(&db, kiran.id).await.unwrap().changes, 0);
    }

    #[tokio::test]
    async fn test_resource_crud_with_attachment() {
        let db = demo_db();
        let created = insert_resource(
            &db,
            "Harvest Planning Video",
            "Guides",
            Some("Season planning walkthrough"),
            None,
            None,
            None,
            3,
        )
        .await
        .unwrap();
        let id = created.last_insert_id.unwrap();

        attach_resource_file(&db, id, "planning.mp4", "AAAA", "video")
            .await
            .unwrap();

        let detail = resource_detail(&db, id).await.unwrap().unwrap();
        assert_eq!(detail.file_name.as_deref(), Some("planning.mp4"));
        assert_eq!(detail.file_type, Some(crate::FileType::Video));
        assert_eq!(detail.author_name.as_deref(), Some("Meera Patel"));

        delete_resource(&db, id).await.unwrap();
        assert!(resource_detail(&db, id).await.unwrap().is_none());
        assert_eq!(list_resources(&db).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_forum_create_and_reply() {
        let db = demo_db();
        let created = insert_forum(
            &db,
            "Market Prices",
            Some("Weekly mandi price threads"),
            2,
            Some("Finance"),
        )
        .await
        .unwrap();
        let forum_id = created.last_insert_id.unwrap();

        insert_forum_post(&db, forum_id, 3, "Onion prices are up this week.")
            .await
            .unwrap();

        let posts = forum_posts(&db, forum_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author_name.as_deref(), Some("Meera Patel"));
    }

    #[tokio::test]
    async fn test_push_broadcast_notification() {
        let db = demo_db();
        push_notification(
            &db,
            None,
            "Maintenance Window",
            "The platform will be briefly unavailable tonight",
            crate::NotificationLevel::Warning,
        )
        .await
        .unwrap();

        // Broadcasts reach every account.
        let for_public = notifications_for_user(&db, 4, 10).await.unwrap();
        assert!(
            for_public
                .iter()
                .any(|n| n.title == "Maintenance Window" && n.user_id.is_none())
        );
        assert_eq!(list_notifications(&db).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sector_insert_and_connection() {
        let db = demo_db();
        let created = insert_sector(
            &db,
            "Mandi Direct",
            "Marketplace",
            Some("ops@mandidirect.in"),
            Some("Central India"),
            None,
        )
        .await
        .unwrap();
        let sector_id = created.last_insert_id.unwrap();

        insert_connection(
            &db,
            2,
            sector_id,
            ConnectionStatus::Pending,
            Some("Asked about listing fees"),
        )
        .await
        .unwrap();

        let mine = connections_for_user(&db, 2).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().any(|c| c.sector_name.as_deref() == Some("Mandi Direct")));
    }

    #[tokio::test]
    async fn test_upcoming_events_respects_limit() {
        let db = demo_db();
        let events = upcoming_events(&db, 1).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Organic Farming Workshop");
    }

    #[tokio::test]
    async fn test_content_feed_for_audience() {
        let db = demo_db();
        let rows = content_for_audience(&db, "public").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Monsoon Sowing Calendar");
    }
}
