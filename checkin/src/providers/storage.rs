//! Credential storage.
//!
//! Remembered sessions are kept under three keys:
//!
//! | Key | Value |
//! |---|---|
//! | `checkin.rememberMe` | `"true"` |
//! | `checkin.authToken` | bearer token |
//! | `checkin.user` | user object as JSON |
//!
//! Nothing is kept when remember-me is off.

use crate::error::StorageError;
use crate::state::Session;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Key of the remember-me flag.
pub const REMEMBER_ME_KEY: &str = "checkin.rememberMe";
/// Key of the bearer token.
pub const TOKEN_KEY: &str = "checkin.authToken";
/// Key of the JSON user object.
pub const USER_KEY: &str = "checkin.user";

/// Key/value storage for secrets.
pub trait SecureStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete a value. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn delete_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Read a remembered session.
///
/// Only returns a session when the remember-me flag is set and both token and
/// user are present and readable. Storage failures are logged and yield
/// `None`; restoring never fails.
pub async fn restore_session<S: SecureStorage>(storage: &S) -> Option<Session> {
    match try_restore(storage).await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!(%error, "Ignoring unreadable persisted session");
            None
        },
    }
}

async fn try_restore<S: SecureStorage>(storage: &S) -> Result<Option<Session>, StorageError> {
    if storage.get_item(REMEMBER_ME_KEY).await?.as_deref() != Some("true") {
        return Ok(None);
    }

    let token = storage.get_item(TOKEN_KEY).await?.filter(|t| !t.is_empty());
    let user = storage.get_item(USER_KEY).await?.filter(|u| !u.is_empty());
    let (Some(token), Some(user)) = (token, user) else {
        return Ok(None);
    };

    let user = serde_json::from_str(&user).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    Ok(Some(Session { token, user }))
}

/// Persist a session when `remember_me` is set, otherwise purge any stale copy.
///
/// # Errors
///
/// Returns the first storage failure.
pub async fn persist_session<S: SecureStorage>(
    storage: &S,
    session: &Session,
    remember_me: bool,
) -> Result<(), StorageError> {
    if !remember_me {
        return purge_session(storage).await;
    }

    let user = serde_json::to_string(&session.user).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    storage.set_item(REMEMBER_ME_KEY, "true").await?;
    storage.set_item(TOKEN_KEY, &session.token).await?;
    storage.set_item(USER_KEY, &user).await
}

/// Delete every persisted credential.
///
/// All keys are attempted even if one fails.
///
/// # Errors
///
/// Returns the first storage failure.
pub async fn purge_session<S: SecureStorage>(storage: &S) -> Result<(), StorageError> {
    let mut first_error = None;
    for key in [REMEMBER_ME_KEY, TOKEN_KEY, USER_KEY] {
        if let Err(error) = storage.delete_item(key).await {
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Orders persist and purge operations on the remembered session.
///
/// Tickets are taken in the order the reducer runs. An operation whose
/// ticket is older than the last one applied is skipped, so a persist can
/// never land after the purge that followed it.
#[derive(Debug, Clone, Default)]
pub struct StorageQueue {
    issued: Arc<AtomicU64>,
    applied: Arc<Mutex<u64>>,
}

impl StorageQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ticket.
    #[must_use]
    pub fn ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `work` under `ticket`.
    ///
    /// Returns `None` without running it when a later ticket already ran.
    pub async fn run<F, T>(&self, ticket: u64, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let mut applied = self.applied.lock().await;
        if ticket < *applied {
            tracing::debug!(ticket, applied = *applied, "Skipping superseded storage operation");
            return None;
        }
        let output = work.await;
        *applied = ticket;
        Some(output)
    }
}

/// Storage keeping one file per key in a private directory.
#[derive(Debug, Clone)]
pub struct FileSecureStorage {
    dir: PathBuf,
}

impl FileSecureStorage {
    /// Store files under `dir` (created on first write).
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the files live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if valid {
            Ok(self.dir.join(key))
        } else {
            Err(StorageError::Unavailable(format!("invalid key: {key}")))
        }
    }
}

fn io_error(error: &std::io::Error) -> StorageError {
    StorageError::Io(error.to_string())
}

impl SecureStorage for FileSecureStorage {
    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        let path = self.path(key);
        async move {
            match tokio::fs::read_to_string(path?).await {
                Ok(value) => Ok(Some(value)),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(error) => Err(io_error(&error)),
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        let path = self.path(key);
        let dir = self.dir.clone();
        let value = value.to_string();
        async move {
            let path = path?;
            tokio::fs::create_dir_all(&dir).await.map_err(|e| io_error(&e))?;

            let mut options = tokio::fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            options.mode(0o600);
            let mut file = options.open(&path).await.map_err(|e| io_error(&e))?;

            // A file left over from an older write may predate the mode
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(0o600))
                    .await
                    .map_err(|e| io_error(&e))?;
            }

            file.write_all(value.as_bytes()).await.map_err(|e| io_error(&e))?;
            file.flush().await.map_err(|e| io_error(&e))
        }
    }

    fn delete_item(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        let path = self.path(key);
        async move {
            match tokio::fs::remove_file(path?).await {
                Err(error) if error.kind() != std::io::ErrorKind::NotFound => Err(io_error(&error)),
                _ => Ok(()),
            }
        }
    }
}
