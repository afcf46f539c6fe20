use std::path::PathBuf;

use async_trait::async_trait;
use ccgrant::{ClientAssertionProvider, SecretString};
use ccgrant_http::BoxError;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

/// Client assertion read from a file on every token request.
///
/// Suits projected workload identity tokens that a sidecar or the platform
/// rotates on disk.
#[derive(Debug, Clone)]
pub struct FileAssertion {
    path: PathBuf,
}

impl FileAssertion {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClientAssertionProvider for FileAssertion {
    async fn assertion(&self, cancel: &CancellationToken) -> Result<SecretString, BoxError> {
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err("assertion read cancelled".into()),
            raw = tokio::fs::read_to_string(&self.path) => Zeroizing::new(raw?),
        };

        let assertion = raw.trim();
        if assertion.is_empty() {
            return Err(format!("assertion file {} is empty", self.path.display()).into());
        }
        tracing::debug!(path = %self.path.display(), "client assertion loaded");
        Ok(SecretString::new(assertion))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn rereads_file_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assertion.jwt");
        std::fs::write(&path, "  jwt-1\n").unwrap();

        let provider = FileAssertion::new(&path);
        let cancel = CancellationToken::new();
        assert_eq!(provider.assertion(&cancel).await.unwrap().expose(), "jwt-1");

        std::fs::write(&path, "jwt-2").unwrap();
        assert_eq!(provider.assertion(&cancel).await.unwrap().expose(), "jwt-2");
    }

    #[tokio::test]
    async fn empty_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let err = FileAssertion::new(file.path())
            .assertion(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileAssertion::new(dir.path().join("absent.jwt"));
        assert!(provider.assertion(&CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn cancelled_read_fails() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = FileAssertion::new("/nonexistent")
            .assertion(&cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }
}
