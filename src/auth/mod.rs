//! Upload credentials.
//!
//! Resume uploads are guarded by a credential store so the authentication
//! boundary stays swappable even though the default backing is a single
//! static secret from the environment.

pub trait CredentialStore: Send + Sync {
    /// Whether uploads are enabled at all.
    fn enabled(&self) -> bool;

    /// Check a presented bearer token.
    fn authorize(&self, token: &str) -> bool;
}

/// Single static secret, typically `SECRET_KEY` from the environment.
/// Uploads are disabled when no secret is configured.
pub struct StaticCredentials {
    secret: Option<String>,
}

impl StaticCredentials {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

impl CredentialStore for StaticCredentials {
    fn enabled(&self) -> bool {
        self.secret.is_some()
    }

    fn authorize(&self, token: &str) -> bool {
        self.secret.as_deref().is_some_and(|secret| secret == token)
    }
}
