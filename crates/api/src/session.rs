//! Accounts, sessions, and per-user state.
//!
//! Everything here lives in memory for the lifetime of the process. Each
//! account owns one [`UserState`] behind its own mutex, so requests from
//! different users never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;

use atlasboard_core::bookmark::BookmarkStore;
use atlasboard_core::error::CoreError;
use atlasboard_core::map::MapState;
use atlasboard_core::population::{PopulationTable, REGION_COLUMNS};
use atlasboard_core::table::{DecodedText, Table, TextEncoding};
use atlasboard_core::types::{DatasetId, Timestamp};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};

/* --------------------------------------------------------------------------
Datasets
-------------------------------------------------------------------------- */

/// Parsed content of an uploaded file.
#[derive(Debug)]
pub enum DatasetContent {
    /// A table with a region column; region parts are pre-parsed.
    Population(PopulationTable),
    /// Any other table (delta exports, weather statistics, ...).
    Plain(Table),
}

#[derive(Debug)]
pub struct Dataset {
    pub id: DatasetId,
    pub file_name: String,
    pub encoding: TextEncoding,
    pub confidence: f64,
    pub uploaded_at: Timestamp,
    content: DatasetContent,
}

/// Listing view of a [`Dataset`].
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub file_name: String,
    pub encoding: &'static str,
    pub confidence: f64,
    pub rows: usize,
    pub columns: Vec<String>,
    pub has_regions: bool,
    pub uploaded_at: Timestamp,
}

impl Dataset {
    /// Wrap a decoded table, indexing regions when the table has them.
    pub fn new(file_name: String, table: Table, decoded: &DecodedText) -> Result<Self, CoreError> {
        let has_regions = REGION_COLUMNS
            .iter()
            .any(|c| table.column_index(c).is_some());
        let content = if has_regions {
            DatasetContent::Population(PopulationTable::from_table(table)?)
        } else {
            DatasetContent::Plain(table)
        };

        Ok(Self {
            id: uuid::Uuid::new_v4(),
            file_name,
            encoding: decoded.encoding,
            confidence: decoded.confidence,
            uploaded_at: chrono::Utc::now(),
            content,
        })
    }

    pub fn table(&self) -> &Table {
        match &self.content {
            DatasetContent::Population(p) => p.table(),
            DatasetContent::Plain(t) => t,
        }
    }

    /// The region-indexed view, or a validation error for tables without a
    /// region column.
    pub fn population(&self) -> Result<&PopulationTable, CoreError> {
        match &self.content {
            DatasetContent::Population(p) => Ok(p),
            DatasetContent::Plain(_) => Err(CoreError::Validation(format!(
                "Dataset '{}' has no region column (행정구역 or 법정구역)",
                self.file_name
            ))),
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        let table = self.table();
        DatasetSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            encoding: self.encoding.as_str(),
            confidence: self.confidence,
            rows: table.len(),
            columns: table.headers().to_vec(),
            has_regions: matches!(self.content, DatasetContent::Population(_)),
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Uploaded datasets of one user, in upload order.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: Vec<Dataset>,
}

impl DatasetRegistry {
    pub fn insert(&mut self, dataset: Dataset) -> &Dataset {
        self.datasets.push(dataset);
        let idx = self.datasets.len() - 1;
        &self.datasets[idx]
    }

    pub fn get(&self, id: DatasetId) -> Result<&Dataset, CoreError> {
        self.datasets
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CoreError::not_found("Dataset", id))
    }

    pub fn remove(&mut self, id: DatasetId) -> Result<Dataset, CoreError> {
        let idx = self
            .datasets
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| CoreError::not_found("Dataset", id))?;
        Ok(self.datasets.remove(idx))
    }

    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.datasets.iter().map(Dataset::summary).collect()
    }
}

/* --------------------------------------------------------------------------
Accounts
-------------------------------------------------------------------------- */

/// Everything one user works with.
#[derive(Debug, Default)]
pub struct UserState {
    pub bookmarks: BookmarkStore,
    pub map: MapState,
    pub datasets: DatasetRegistry,
}

#[derive(Debug)]
struct Account {
    password_hash: String,
    state: Arc<Mutex<UserState>>,
}

/// Outcome of [`AccountRegistry::login_or_register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginOutcome {
    Registered,
    LoggedIn,
}

/// A logged-in session, live until logout or `expires_at`.
#[derive(Debug, Clone)]
struct Session {
    username: String,
    /// Unix seconds, the token's `exp`.
    expires_at: i64,
}

impl Session {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

/// Accounts keyed by username plus the set of active session keys.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
    /// Session key (`jti`) to its owner.
    sessions: RwLock<HashMap<String, Session>>,
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn check_password(password: &str, stored_hash: String) -> AppResult<()> {
    let password = password.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::InternalError(format!("Password task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if valid {
        Ok(())
    } else {
        Err(CoreError::Unauthorized("Invalid username or password".into()).into())
    }
}

async fn new_password_hash(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(format!("Password task failed: {e}")))?
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in, registering the account first when the username is unknown.
    ///
    /// Argon2 runs on the blocking pool with no registry lock held. The
    /// write lock is taken only to insert; if another registration of the
    /// same name got there first, this caller is checked against the
    /// winner's password.
    pub async fn login_or_register(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let stored = self
            .accounts
            .read()
            .await
            .get(username)
            .map(|a| a.password_hash.clone());
        if let Some(stored_hash) = stored {
            check_password(password, stored_hash).await?;
            return Ok(LoginOutcome::LoggedIn);
        }

        let password_hash = new_password_hash(password).await?;

        let winner_hash = {
            let mut accounts = self.accounts.write().await;
            match accounts.get(username) {
                Some(existing) => existing.password_hash.clone(),
                None => {
                    accounts.insert(
                        username.to_string(),
                        Account {
                            password_hash,
                            state: Arc::new(Mutex::new(UserState::default())),
                        },
                    );
                    return Ok(LoginOutcome::Registered);
                }
            }
        };
        check_password(password, winner_hash).await?;
        Ok(LoginOutcome::LoggedIn)
    }

    pub async fn user_state(&self, username: &str) -> Option<Arc<Mutex<UserState>>> {
        self.accounts
            .read()
            .await
            .get(username)
            .map(|a| Arc::clone(&a.state))
    }

    /// Register a session valid until `expires_at` (Unix seconds). Sessions
    /// that have already expired are dropped on the way.
    pub async fn open_session(&self, session_key: String, username: &str, expires_at: i64) {
        let now = unix_now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.is_live(now));
        sessions.insert(
            session_key,
            Session {
                username: username.to_string(),
                expires_at,
            },
        );
    }

    /// `true` when `session_key` is live and belongs to `username`.
    pub async fn session_is_active(&self, session_key: &str, username: &str) -> bool {
        let now = unix_now();
        self.sessions
            .read()
            .await
            .get(session_key)
            .is_some_and(|s| s.username == username && s.is_live(now))
    }

    /// Returns `false` when the session was not active.
    pub async fn revoke_session(&self, session_key: &str) -> bool {
        self.sessions.write().await.remove(session_key).is_some()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Sessions currently held, expired ones included until the next sweep.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
