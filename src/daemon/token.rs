//! Session token shared between the daemon and its clients

use crate::error::{JGrabError, JGrabResult};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Random token regenerated on every daemon start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Write the token so that only the current user can read it
    pub async fn write_to(&self, path: &Path) -> JGrabResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JGrabError::TokenWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }

        fs::write(path, &self.0)
            .await
            .map_err(|e| JGrabError::TokenWrite {
                path: path.to_path_buf(),
                source: e,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(|e| JGrabError::TokenWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Session token written to {}", path.display());
        Ok(())
    }

    pub async fn read_from(path: &Path) -> JGrabResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JGrabError::TokenRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self(content.trim().to_string()))
    }

    /// Compare with a line received from a client
    pub fn matches(&self, line: &str) -> bool {
        line.trim_end_matches(['\r', '\n']).trim() == self.0
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tokens_are_unique() {
        assert_ne!(SessionToken::generate(), SessionToken::generate());
    }

    #[test]
    fn matching_ignores_line_terminator() {
        let token = SessionToken::from("abc-123");
        assert!(token.matches("abc-123\n"));
        assert!(token.matches("abc-123\r\n"));
        assert!(!token.matches("abc-124\n"));
        assert!(!token.matches(""));
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("home").join("token");
        let token = SessionToken::generate();

        token.write_to(&path).await.unwrap();

        assert_eq!(SessionToken::read_from(&path).await.unwrap(), token);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn missing_token_file() {
        let dir = TempDir::new().unwrap();
        let err = SessionToken::read_from(&dir.path().join("token"))
            .await
            .unwrap_err();
        assert!(matches!(err, JGrabError::TokenRead { .. }));
    }
}
