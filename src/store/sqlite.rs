use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, last_used_at";

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, endpoint, p256dh, auth, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Each call yields an empty store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<PushSubscription> {
    Ok(PushSubscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        endpoint: row.get(2)?,
        p256dh: row.get(3)?,
        auth: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Push subscription operations

    fn upsert_subscription(&self, sub: &PushSubscription) -> Result<PushSubscription> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (endpoint) DO UPDATE SET
                user_id = excluded.user_id,
                p256dh = excluded.p256dh,
                auth = excluded.auth,
                created_at = excluded.created_at",
            params![
                sub.id,
                sub.user_id,
                sub.endpoint,
                sub.p256dh,
                sub.auth,
                format_datetime(&sub.created_at),
            ],
        )?;

        // The row keeps its original id when the endpoint already existed.
        conn.query_row(
            &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions WHERE endpoint = ?1"),
            params![sub.endpoint],
            subscription_from_row,
        )
        .map_err(Error::from)
    }

    fn get_subscription_by_endpoint(&self, endpoint: &str) -> Result<Option<PushSubscription>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions WHERE endpoint = ?1"),
            params![endpoint],
            subscription_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_subscriptions(&self, cursor: &str, limit: i32) -> Result<Vec<PushSubscription>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions
             WHERE endpoint > ?1 ORDER BY endpoint LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], subscription_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_subscription(&self, endpoint: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM push_subscriptions WHERE endpoint = ?1",
            params![endpoint],
        )?;
        Ok(rows > 0)
    }

    fn delete_subscription_if_keys(&self, endpoint: &str, p256dh: &str, auth: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM push_subscriptions WHERE endpoint = ?1 AND p256dh = ?2 AND auth = ?3",
            params![endpoint, p256dh, auth],
        )?;
        Ok(rows > 0)
    }

    fn count_subscriptions(&self) -> Result<i64> {
        let conn = self.conn();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM push_subscriptions", [], |row| row.get(0))?;
        Ok(count)
    }

    // Admin token check

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn subscription(id: &str, endpoint: &str, p256dh: &str, auth: &str) -> PushSubscription {
        PushSubscription {
            id: id.to_string(),
            user_id: None,
            endpoint: endpoint.to_string(),
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"tokens".to_string()));
        assert!(tables.contains(&"push_subscriptions".to_string()));
    }

    #[test]
    fn test_upsert_same_endpoint_overwrites_keys() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();

        let first = store
            .upsert_subscription(&subscription("sub-1", "https://push.example/e1", "k1", "a1"))
            .unwrap();

        let mut second = subscription("sub-2", "https://push.example/e1", "k2", "a2");
        second.user_id = Some("reader-9".to_string());
        let stored = store.upsert_subscription(&second).unwrap();

        assert_eq!(store.count_subscriptions().unwrap(), 1);
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.p256dh, "k2");
        assert_eq!(stored.auth, "a2");
        assert_eq!(stored.user_id.as_deref(), Some("reader-9"));
    }

    #[test]
    fn test_conditional_delete_spares_refreshed_keys() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
            .upsert_subscription(&subscription("sub-1", "https://push.example/e1", "k2", "a2"))
            .unwrap();

        assert!(!store.delete_subscription_if_keys("https://push.example/e1", "k1", "a1").unwrap());
        assert_eq!(store.count_subscriptions().unwrap(), 1);

        assert!(store.delete_subscription_if_keys("https://push.example/e1", "k2", "a2").unwrap());
        assert_eq!(store.count_subscriptions().unwrap(), 0);
    }

    #[test]
    fn test_list_subscriptions_pages_by_endpoint() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();

        for (i, endpoint) in ["https://a/1", "https://a/2", "https://a/3"].iter().enumerate() {
            store
                .upsert_subscription(&subscription(&format!("s{i}"), endpoint, "k", "a"))
                .unwrap();
        }

        let page = store.list_subscriptions("", 2).unwrap();
        assert_eq!(page.len(), 2);
        let rest = store.list_subscriptions(&page[1].endpoint, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].endpoint, "https://a/3");
    }

    #[test]
    fn test_delete_subscription_reports_existence() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();

        assert!(!store.delete_subscription("https://never/registered").unwrap());

        store
            .upsert_subscription(&subscription("s1", "https://a/1", "k", "a"))
            .unwrap();
        assert!(store.delete_subscription("https://a/1").unwrap());
        assert!(store.get_subscription_by_endpoint("https://a/1").unwrap().is_none());
    }

    #[test]
    fn test_token_lookup_collision() {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();

        let token1 = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup123".to_string(),
            is_admin: true,
            user_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        store.create_token(&token1).unwrap();
        assert!(store.has_admin_token().unwrap());

        let token2 = Token {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            token_lookup: "lookup123".to_string(), // Same lookup
            is_admin: true,
            user_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };

        let result = store.create_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }
}
