use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::PaywallError;
use crate::storage::database::Database;
use crate::storage::time::{parse_utc_string, to_utc_string};
use crate::users::{
    CreateUserPayload, ReminderEntry, Subscription, UsageCounter, UserRecord, UserStore,
};

/// Entitlement portion of the user row, stored as one JSON document in the
/// `content` column. Id, email, version and timestamps live in real columns.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntitlementDoc {
    #[serde(default)]
    subscription: Option<Subscription>,
    #[serde(default)]
    usage: HashMap<String, UsageCounter>,
    #[serde(default)]
    reminders: Vec<ReminderEntry>,
    #[serde(default)]
    is_premium: bool,
    #[serde(default)]
    premium_since: Option<DateTime<Utc>>,
}

impl EntitlementDoc {
    fn of(user: &UserRecord) -> Self {
        Self {
            subscription: user.subscription.clone(),
            usage: user.usage.clone(),
            reminders: user.reminders.clone(),
            is_premium: user.is_premium,
            premium_since: user.premium_since,
        }
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<(UserRecord, String)> {
    let id: String = row.get(0)?;
    let email: String = row.get(1)?;
    let content: String = row.get(2)?;
    let version: i64 = row.get(3)?;
    let created_at_s: String = row.get(4)?;
    let updated_at_s: String = row.get(5)?;

    let parse_ts = |idx: usize, s: &str| {
        parse_utc_string(s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })
    };
    let created_at = parse_ts(4, &created_at_s)?;
    let updated_at = parse_ts(5, &updated_at_s)?;

    Ok((
        UserRecord {
            id,
            email,
            subscription: None,
            usage: HashMap::new(),
            reminders: Vec::new(),
            is_premium: false,
            premium_since: None,
            version,
            created_at,
            updated_at,
        },
        content,
    ))
}

fn hydrate(mut user: UserRecord, content: &str) -> Result<UserRecord, PaywallError> {
    let doc: EntitlementDoc = serde_json::from_str(content)?;
    user.subscription = doc.subscription;
    user.usage = doc.usage;
    user.reminders = doc.reminders;
    user.is_premium = doc.is_premium;
    user.premium_since = doc.premium_since;
    Ok(user)
}

#[async_trait]
impl UserStore for Database {
    async fn create_user(&self, payload: CreateUserPayload) -> Result<UserRecord, PaywallError> {
        let email = payload.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(PaywallError::Validation("invalid email".into()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let content = serde_json::to_string(&EntitlementDoc::default())?;

        let conn = self.connection.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (id, email, content, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            rusqlite::params![&id, &email, &content, to_utc_string(&now), to_utc_string(&now)],
        )?;
        if inserted == 0 {
            return Err(PaywallError::Conflict(format!(
                "email already registered: {}",
                email
            )));
        }

        Ok(UserRecord {
            id,
            email,
            subscription: None,
            usage: HashMap::new(),
            reminders: Vec::new(),
            is_premium: false,
            premium_since: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, PaywallError> {
        let conn = self.connection.lock().await;
        let row = conn
            .query_row(
                "SELECT id, email, content, version, created_at, updated_at
                 FROM users WHERE id = ?1",
                [id],
                row_to_user,
            )
            .optional()?;
        drop(conn);

        match row {
            Some((user, content)) => Ok(Some(hydrate(user, &content)?)),
            None => Ok(None),
        }
    }

    async fn save_user(&self, user: &UserRecord) -> Result<UserRecord, PaywallError> {
        let now = Utc::now();
        let content = serde_json::to_string(&EntitlementDoc::of(user))?;

        let conn = self.connection.lock().await;
        // Single conditional update; a stale version token writes nothing.
        let changed = conn.execute(
            "UPDATE users SET content = ?1, version = version + 1, updated_at = ?2
             WHERE id = ?3 AND version = ?4",
            rusqlite::params![&content, to_utc_string(&now), &user.id, user.version],
        )?;
        if changed == 0 {
            let exists: Option<String> = conn
                .query_row("SELECT id FROM users WHERE id = ?1", [&user.id], |row| {
                    row.get(0)
                })
                .optional()?;
            return match exists {
                None => Err(PaywallError::UserNotFound(user.id.clone())),
                Some(_) => Err(PaywallError::Conflict(format!(
                    "user {} was modified concurrently",
                    user.id
                ))),
            };
        }

        let mut saved = user.clone();
        saved.version += 1;
        saved.updated_at = now;
        Ok(saved)
    }
}
