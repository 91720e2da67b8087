//! Exporting advisor messages to a cloud document.
//!
//! Two seams: a [`CredentialProvider`] that knows whether a bearer token is
//! available and how to start the authorization flow, and a
//! [`DocumentExporter`] that appends text to a document with that token.

mod google_auth;
mod google_docs;

pub use google_auth::{GoogleAuth, GoogleAuthConfig, StoredToken};
pub use google_docs::GoogleDocsExporter;

use crate::error::ExportError;

pub trait CredentialProvider: Send + Sync {
    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Start the interactive authorization flow. Fire-and-forget.
    fn initiate_auth(&self);

    /// A usable (unexpired) access token, if any.
    fn access_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReceipt {
    pub document_id: String,
    pub document_url: Option<String>,
}

#[async_trait::async_trait]
pub trait DocumentExporter: Send + Sync {
    /// Append `text` to the export document.
    async fn save(&self, text: &str) -> Result<ExportReceipt, ExportError>;
}

/// Maps an HTTP status to the export error taxonomy.
/// 401 and 403 both mean the credential must be renewed.
pub(crate) fn classify_status(status: u16, body: String) -> ExportError {
    match status {
        401 | 403 => ExportError::AuthExpired,
        _ => ExportError::Api { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(401, String::new()), ExportError::AuthExpired));
        assert!(matches!(classify_status(403, String::new()), ExportError::AuthExpired));
        assert!(matches!(
            classify_status(500, "boom".into()),
            ExportError::Api { status: 500, .. }
        ));
    }
}
