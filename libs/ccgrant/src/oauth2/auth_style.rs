use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use super::types::AuthStyle;

/// Auth styles learned by `AutoDetect`, keyed by token endpoint URL.
///
/// Each [`TokenExchanger`](super::exchange::TokenExchanger) owns one by
/// default. Clones share entries, so exchangers talking to the same
/// authorization server can share what was learned.
#[derive(Clone, Debug, Default)]
pub struct AuthStyleCache {
    styles: Arc<RwLock<HashMap<String, AuthStyle>>>,
}

impl AuthStyleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Style that last succeeded against `endpoint`.
    #[must_use]
    pub fn get(&self, endpoint: &Url) -> Option<AuthStyle> {
        self.styles.read().get(endpoint.as_str()).copied()
    }

    /// Record a working style. `AutoDetect` is never stored.
    pub fn record(&self, endpoint: &Url, style: AuthStyle) {
        if style == AuthStyle::AutoDetect {
            return;
        }
        self.styles.write().insert(endpoint.as_str().to_owned(), style);
    }

    /// Forget what was learned for `endpoint`.
    pub fn forget(&self, endpoint: &Url) {
        self.styles.write().remove(endpoint.as_str());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.read().is_empty()
    }
}
