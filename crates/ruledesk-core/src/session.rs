use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{data_dir, write_atomic, CoreError};

/// Who is signed in. The user record is whatever the auth server returned.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Session {
            token: Some(token.into()),
            user: None,
        }
    }
}

/// Auth state handed to whatever needs it instead of living in a global.
pub trait SessionContext: Send + Sync {
    fn current(&self) -> Session;

    /// Stores the parts of `session` that are set; unset parts keep their old value.
    fn set(&self, session: Session) -> Result<(), CoreError>;

    fn clear(&self) -> Result<(), CoreError>;

    fn token(&self) -> Option<String> {
        self.current().token.filter(|t| !t.is_empty())
    }

    fn user(&self) -> Option<Value> {
        self.current().user
    }

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

fn merge(into: &mut Session, update: Session) {
    if let Some(token) = update.token.filter(|t| !t.is_empty()) {
        into.token = Some(token);
    }
    if update.user.is_some() {
        into.user = update.user;
    }
}

#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Session>,
}

impl MemorySession {
    pub fn new(session: Session) -> Self {
        MemorySession {
            inner: RwLock::new(session),
        }
    }
}

impl SessionContext for MemorySession {
    fn current(&self) -> Session {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, session: Session) -> Result<(), CoreError> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        merge(&mut guard, session);
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Session::default();
        Ok(())
    }
}

/// Session persisted as JSON so separate CLI invocations share a login.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSession { path: path.into() }
    }

    /// `~/.ruledesk/session.json`
    pub fn default_location() -> Self {
        FileSession::new(data_dir().join("session.json"))
    }
}

impl SessionContext for FileSession {
    fn current(&self) -> Session {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Session::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable session");
            Session::default()
        })
    }

    fn set(&self, session: Session) -> Result<(), CoreError> {
        let mut stored = self.current();
        merge(&mut stored, session);
        let json = serde_json::to_string_pretty(&stored)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::debug!(path = %self.path.display(), "session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_session_merges_updates() {
        let session = MemorySession::default();
        assert!(!session.is_authenticated());

        session.set(Session::with_token("t1")).unwrap();
        session
            .set(Session {
                token: None,
                user: Some(json!({ "email": "a@b.c" })),
            })
            .unwrap();
        assert_eq!(session.token().as_deref(), Some("t1"));
        assert_eq!(session.user(), Some(json!({ "email": "a@b.c" })));

        session.clear().unwrap();
        assert_eq!(session.current(), Session::default());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let session = MemorySession::new(Session::with_token(""));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn file_session_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        FileSession::new(&path).set(Session::with_token("abc")).unwrap();
        let reopened = FileSession::new(&path);
        assert_eq!(reopened.token().as_deref(), Some("abc"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(!reopened.is_authenticated());
        reopened.clear().unwrap();
    }

    #[test]
    fn corrupt_session_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();
        assert_eq!(FileSession::new(&path).current(), Session::default());
    }
}
