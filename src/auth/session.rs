use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use super::IdentityResolver;
use crate::models::OwnerId;
use crate::store::StoreError;

/// Resolves credentials against the `sessions` table maintained by the login flow.
#[derive(Clone)]
pub struct PgSessionResolver {
    pool: PgPool,
}

impl PgSessionResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for PgSessionResolver {
    async fn resolve(&self, credential: &str) -> Result<Option<OwnerId>, StoreError> {
        let owner = sqlx::query_scalar::<_, OwnerId>(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(credential)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }
}

/// Fixed token table, for the memory backend and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    sessions: HashMap<String, OwnerId>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, token: impl Into<String>, owner: impl Into<OwnerId>) -> Self {
        self.sessions.insert(token.into(), owner.into());
        self
    }

    /// Parses `token=owner` pairs separated by commas. Malformed pairs are skipped.
    pub fn parse(pairs: &str) -> Self {
        pairs
            .split(',')
            .filter_map(|pair| {
                let (token, owner) = pair.trim().split_once('=')?;
                let (token, owner) = (token.trim(), owner.trim());
                if token.is_empty() || owner.is_empty() {
                    tracing::warn!("Ignoring malformed static session entry");
                    return None;
                }
                Some((token.to_string(), OwnerId::new(owner)))
            })
            .fold(Self::new(), |resolver, (token, owner)| {
                resolver.with_session(token, owner)
            })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, credential: &str) -> Result<Option<OwnerId>, StoreError> {
        Ok(self.sessions.get(credential).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_lookup() {
        let resolver = StaticIdentityResolver::new().with_session("tok-a", "alice");
        assert_eq!(
            resolver.resolve("tok-a").await.unwrap(),
            Some(OwnerId::new("alice"))
        );
        assert_eq!(resolver.resolve("tok-b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_parse_static_sessions() {
        let resolver = StaticIdentityResolver::parse("tok-a=alice, tok-b = bob,broken,=x");
        assert_eq!(resolver.len(), 2);
        assert_eq!(
            resolver.resolve("tok-b").await.unwrap(),
            Some(OwnerId::new("bob"))
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(StaticIdentityResolver::parse("").is_empty());
    }
}
