//! Store error types.

use thiserror::Error;

/// Errors that can occur while reading or writing session data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure.
    #[error("データベースエラー: {0}")]
    Database(#[from] rusqlite::Error),

    /// The hosted store could not be reached.
    #[error("通信エラー: {0}")]
    Network(#[from] reqwest::Error),

    /// The hosted store answered with a non-success status.
    #[error("サーバーが要求を拒否しました ({status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The record to update does not exist.
    #[error("セッションが見つかりません: {0}")]
    NotFound(String),

    /// A stored value could not be interpreted.
    #[error("保存データの形式が不正です: {0}")]
    InvalidData(String),

    /// No user is signed in.
    #[error("サインインしていません")]
    SignedOut,

    /// The store is unavailable (background task failed, lock poisoned, injected failure).
    #[error("ストアが利用できません: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true if retrying later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::NotFound("abc".to_string());
        assert!(err.to_string().contains("abc"));

        let err = StoreError::Rejected {
            status: 409,
            body: "duplicate key".to_string(),
        };
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("duplicate key"));

        assert_eq!(StoreError::SignedOut.to_string(), "サインインしていません");
    }

    #[test]
    fn test_is_transient() {
        assert!(StoreError::Unavailable("x".into()).is_transient());
        assert!(StoreError::Rejected {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!StoreError::Rejected {
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!StoreError::SignedOut.is_transient());
        assert!(!StoreError::InvalidData("x".into()).is_transient());
    }
}
