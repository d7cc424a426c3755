//! Login session handling.
//!
//! The backend issues a JWT on login. We never verify the signature (the
//! server does that on every request); the payload is decoded only to show
//! who is signed in and to drop sessions that have already expired. The
//! token is persisted in a small sqlite database so restarting the TUI does
//! not force a fresh login.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
  #[serde(default)]
  pub user: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  /// Expiry as unix seconds
  #[serde(default)]
  pub exp: Option<i64>,
}

/// Decode the payload segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims> {
  let payload = token
    .split('.')
    .nth(1)
    .ok_or_else(|| eyre!("malformed token: expected three segments"))?;
  let bytes = URL_SAFE_NO_PAD
    .decode(payload)
    .map_err(|e| eyre!("malformed token payload: {e}"))?;
  serde_json::from_slice(&bytes).map_err(|e| eyre!("malformed token claims: {e}"))
}

#[derive(Debug, Clone)]
pub struct Session {
  pub token: String,
  pub claims: Claims,
}

impl Session {
  pub fn from_token(token: String) -> Result<Self> {
    let claims = decode_claims(&token)?;
    Ok(Self { token, claims })
  }

  pub fn is_expired(&self) -> bool {
    match self.claims.exp {
      Some(exp) => exp <= Utc::now().timestamp(),
      None => false,
    }
  }

  /// Name shown in the header, falling back to the role claim.
  pub fn display_name(&self) -> &str {
    self
      .claims
      .user
      .as_deref()
      .or(self.claims.role.as_deref())
      .unwrap_or("signed in")
  }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS session (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  token TEXT NOT NULL,
  saved_at INTEGER NOT NULL
);
";

/// Persists the login token across runs.
pub struct SessionStore {
  conn: Connection,
}

impl SessionStore {
  /// Open or create the store at the default location
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open session store at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  #[cfg(test)]
  pub fn in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;
    Ok(Self { conn })
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("folio").join("session.db"))
  }

  pub fn save(&self, token: &str) -> Result<()> {
    self.conn.execute(
      "INSERT INTO session (id, token, saved_at) VALUES (1, ?1, ?2)
       ON CONFLICT(id) DO UPDATE SET token = ?1, saved_at = ?2",
      rusqlite::params![token, Utc::now().timestamp()],
    )?;
    Ok(())
  }

  pub fn clear(&self) -> Result<()> {
    self.conn.execute("DELETE FROM session", [])?;
    Ok(())
  }

  /// Returns the persisted session, discarding it if the token is expired
  /// or no longer decodable.
  pub fn load(&self) -> Result<Option<Session>> {
    let token: Option<String> = self
      .conn
      .query_row("SELECT token FROM session WHERE id = 1", [], |row| row.get(0))
      .optional()?;

    let Some(token) = token else {
      return Ok(None);
    };

    match Session::from_token(token) {
      Ok(session) if !session.is_expired() => Ok(Some(session)),
      _ => {
        self.clear()?;
        Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_token(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
  }

  #[test]
  fn test_decode_claims() {
    let token = make_token(serde_json::json!({
      "user": "admin", "role": "admin", "exp": 4102444800i64
    }));
    let claims = decode_claims(&token).unwrap();
    assert_eq!(claims.user.as_deref(), Some("admin"));
    assert_eq!(claims.role.as_deref(), Some("admin"));
    assert_eq!(claims.exp, Some(4102444800));
  }

  #[test]
  fn test_decode_rejects_garbage() {
    assert!(decode_claims("not-a-jwt").is_err());
    assert!(decode_claims("a.!!!.c").is_err());
  }

  #[test]
  fn test_expired_session() {
    let token = make_token(serde_json::json!({"user": "admin", "exp": 1000}));
    let session = Session::from_token(token).unwrap();
    assert!(session.is_expired());

    let token = make_token(serde_json::json!({"user": "admin", "exp": 4102444800i64}));
    let session = Session::from_token(token).unwrap();
    assert!(!session.is_expired());
  }

  #[test]
  fn test_store_round_trip() {
    let store = SessionStore::in_memory().unwrap();
    assert!(store.load().unwrap().is_none());

    let token = make_token(serde_json::json!({"user": "admin", "exp": 4102444800i64}));
    store.save(&token).unwrap();
    let session = store.load().unwrap().unwrap();
    assert_eq!(session.display_name(), "admin");

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
  }

  #[test]
  fn test_store_drops_expired_token() {
    let store = SessionStore::in_memory().unwrap();
    let token = make_token(serde_json::json!({"user": "admin", "exp": 1000}));
    store.save(&token).unwrap();
    assert!(store.load().unwrap().is_none());
    // the stale row is gone too
    let count: i64 = store
      .conn
      .query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 0);
  }
}
