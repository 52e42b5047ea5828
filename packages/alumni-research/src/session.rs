//! Session storage for research runs.
//!
//! Each record is researched inside its own session. The store is opened once
//! at startup, handed to the pipeline, and dropped on shutdown; wiping old
//! sessions is an explicit [`SessionStore::reset`] call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::Turn;
use crate::error::{ResearchError, Result};

/// Conversation state of one research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub app_name: String,
    pub user_id: String,
    pub state: Map<String, Value>,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>, state: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create and persist a fresh session.
    async fn create(&self, app_name: &str, user_id: &str, state: Map<String, Value>) -> Result<Session>;

    async fn get(&self, id: Uuid) -> Result<Option<Session>>;

    /// Persist an existing session. Fails with `SessionNotFound` if it was never created.
    async fn save(&self, session: &Session) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Remove every session. Returns how many were removed.
    async fn reset(&self) -> Result<u64>;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, app_name: &str, user_id: &str, state: Map<String, Value>) -> Result<Session> {
        let session = Session::new(app_name, user_id, state);
        self.sessions.write().await.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session.id)
            .ok_or_else(|| ResearchError::SessionNotFound { id: session.id.to_string() })?;
        *slot = Session {
            updated_at: Utc::now(),
            ..session.clone()
        };
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.sessions.write().await.remove(&id);
        Ok(())
    }

    async fn reset(&self) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len() as u64;
        sessions.clear();
        Ok(count)
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
    use std::str::FromStr;
    use tracing::info;

    fn session_err(e: impl std::error::Error + Send + Sync + 'static) -> ResearchError {
        ResearchError::Session(Box::new(e))
    }

    #[derive(sqlx::FromRow)]
    struct SessionRow {
        id: String,
        app_name: String,
        user_id: String,
        state: String,
        turns: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl SessionRow {
        fn into_session(self) -> Result<Session> {
            Ok(Session {
                id: Uuid::parse_str(&self.id).map_err(session_err)?,
                app_name: self.app_name,
                user_id: self.user_id,
                state: serde_json::from_str(&self.state)?,
                turns: serde_json::from_str(&self.turns)?,
                created_at: self.created_at,
                updated_at: self.updated_at,
            })
        }
    }

    /// SQLite-backed session store.
    #[derive(Debug, Clone)]
    pub struct SqliteSessionStore {
        pool: SqlitePool,
    }

    impl SqliteSessionStore {
        /// Open (creating if missing) the database at `url` and run migrations.
        pub async fn open(url: &str) -> Result<Self> {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(session_err)?
                .create_if_missing(true);

            // An in-memory database lives only as long as its connection
            let max_connections = if url.contains(":memory:") { 1 } else { 5 };

            let pool = SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await
                .map_err(session_err)?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(session_err)?;

            info!(url, "Session database ready");
            Ok(Self { pool })
        }

        pub async fn close(&self) {
            self.pool.close().await;
        }
    }

    #[async_trait]
    impl SessionStore for SqliteSessionStore {
        async fn create(&self, app_name: &str, user_id: &str, state: Map<String, Value>) -> Result<Session> {
            let session = Session::new(app_name, user_id, state);

            sqlx::query(
                r#"
                INSERT INTO sessions (id, app_name, user_id, state, turns, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(session.id.to_string())
            .bind(&session.app_name)
            .bind(&session.user_id)
            .bind(serde_json::to_string(&session.state)?)
            .bind(serde_json::to_string(&session.turns)?)
            .bind(session.created_at)
            .bind(session.updated_at)
            .execute(&self.pool)
            .await
            .map_err(session_err)?;

            Ok(session)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Session>> {
            let row = sqlx::query_as::<_, SessionRow>(
                r#"
                SELECT id, app_name, user_id, state, turns, created_at, updated_at
                FROM sessions
                WHERE id = ?1
                "#,
            )
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(session_err)?;

            row.map(SessionRow::into_session).transpose()
        }

        async fn save(&self, session: &Session) -> Result<()> {
            let result = sqlx::query(
                r#"
                UPDATE sessions
                SET state = ?1,
                    turns = ?2,
                    updated_at = ?3
                WHERE id = ?4
                "#,
            )
            .bind(serde_json::to_string(&session.state)?)
            .bind(serde_json::to_string(&session.turns)?)
            .bind(Utc::now())
            .bind(session.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(session_err)?;

            if result.rows_affected() == 0 {
                return Err(ResearchError::SessionNotFound { id: session.id.to_string() });
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            sqlx::query("DELETE FROM sessions WHERE id = ?1")
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(session_err)?;
            Ok(())
        }

        async fn reset(&self) -> Result<u64> {
            let result = sqlx::query("DELETE FROM sessions")
                .execute(&self.pool)
                .await
                .map_err(session_err)?;
            Ok(result.rows_affected())
        }
    }
}
