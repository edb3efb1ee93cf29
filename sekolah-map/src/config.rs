//! Engine credential configuration.

/// Environment variable holding the mapping-engine access token.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Configuration needed to construct a map engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfig {
    /// Access token for the engine's tile and style services.
    pub access_token: Option<String>,
}

impl MapConfig {
    /// Read the token from [`ACCESS_TOKEN_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the token through `lookup`, which maps a variable name to its
    /// value.
    #[must_use]
    pub fn from_lookup(lookup: impl FnOnce(&str) -> Option<String>) -> Self {
        Self {
            access_token: lookup(ACCESS_TOKEN_ENV),
        }
    }

    /// Configuration with an explicit token.
    #[must_use]
    pub fn with_access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    /// The usable token, trimmed. Blank tokens count as missing.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
