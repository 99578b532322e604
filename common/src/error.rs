//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid template '{key}': {reason}")]
    InvalidTemplate { key: String, reason: String },

    #[error("Unknown status: {0}. Use Y, N or N/A")]
    UnknownStatus(String),

    #[error("Unknown signature role: {0}. Use acceptor, preparer or proposer")]
    UnknownRole(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_template() {
        let error = Error::InvalidTemplate {
            key: "roof".to_string(),
            reason: "duplicate item id 'A1'".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Invalid template 'roof': duplicate item id 'A1'"
        );
    }

    #[test]
    fn test_error_display_unknown_values() {
        let status = format!("{}", Error::UnknownStatus("maybe".to_string()));
        assert!(status.contains("maybe"));
        assert!(status.contains("N/A"));

        let role = format!("{}", Error::UnknownRole("witness".to_string()));
        assert!(role.contains("witness"));
        assert!(role.contains("preparer"));
    }
}
