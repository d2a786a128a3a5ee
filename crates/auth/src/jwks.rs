//! Identity-provider signing keys (JWKS).
//!
//! [`KeySetSource`] fetches the provider's published key set; [`CachedKeySet`]
//! keeps the last fetched set in memory and refetches when a token names a
//! key id it has not seen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Fetch(String),

    #[error("key set could not be decoded: {0}")]
    Decode(String),
}

/// Somewhere a key set can be read from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

#[async_trait]
impl<S> KeySetSource for Arc<S>
where
    S: KeySetSource + ?Sized,
{
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        (**self).fetch().await
    }
}

/// Upper bound on one key-set request, connect included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Key set served over HTTPS by the identity provider.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpKeySetSource {
    pub fn new(url: impl Into<String>) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Auth0-style location: `https://<domain>/.well-known/jwks.json`.
    pub fn for_domain(domain: &str) -> Result<Self, KeySetError> {
        Self::new(format!(
            "https://{}/.well-known/jwks.json",
            domain.trim_end_matches('/')
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        debug!(url = %self.url, "fetching signing keys");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| KeySetError::Fetch(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| KeySetError::Decode(e.to_string()))
    }
}

/// Fixed key set (tests, offline development).
#[derive(Debug, Clone)]
pub struct StaticKeySet {
    keys: JwkSet,
}

impl StaticKeySet {
    pub fn from_json(json: &str) -> Result<Self, KeySetError> {
        let keys = serde_json::from_str(json).map_err(|e| KeySetError::Decode(e.to_string()))?;
        Ok(Self { keys })
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        Ok(self.keys.clone())
    }
}

/// Default minimum spacing between two fetches triggered by unknown key ids.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

struct Snapshot {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Process-wide cache in front of a [`KeySetSource`].
///
/// There is no expiry: the cached set is replaced only when a lookup misses,
/// and at most once per refresh interval. Fetches are serialized through the
/// write lock.
pub struct CachedKeySet<S> {
    source: S,
    min_refresh: Duration,
    cached: RwLock<Option<Snapshot>>,
}

impl<S: KeySetSource> CachedKeySet<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            min_refresh: MIN_REFRESH_INTERVAL,
            cached: RwLock::new(None),
        }
    }

    pub fn with_min_refresh(mut self, interval: Duration) -> Self {
        self.min_refresh = interval;
        self
    }

    /// The cached set, fetching it on first use.
    pub async fn current(&self) -> Result<Arc<JwkSet>, KeySetError> {
        if let Some(snapshot) = self.cached.read().await.as_ref() {
            return Ok(snapshot.keys.clone());
        }

        let mut slot = self.cached.write().await;
        if let Some(snapshot) = slot.as_ref() {
            return Ok(snapshot.keys.clone());
        }
        self.load(&mut slot).await
    }

    /// Fetch from the source and replace the cached set, ignoring the interval.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, KeySetError> {
        let mut slot = self.cached.write().await;
        self.load(&mut slot).await
    }

    /// Find `kid` in `keys`, refetching once if the set does not contain it
    /// and the last fetch is older than the refresh interval.
    pub async fn find(&self, keys: Arc<JwkSet>, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        if let Some(jwk) = keys.find(kid) {
            return Ok(Some(jwk.clone()));
        }

        let mut slot = self.cached.write().await;
        if let Some(snapshot) = slot.as_ref() {
            // Another request may have refreshed while this one waited for the lock.
            if let Some(jwk) = snapshot.keys.find(kid) {
                return Ok(Some(jwk.clone()));
            }
            if snapshot.fetched_at.elapsed() < self.min_refresh {
                debug!(kid, "key id unknown; refresh throttled");
                return Ok(None);
            }
        }

        debug!(kid, "key id not cached; refreshing key set");
        let keys = self.load(&mut slot).await?;
        Ok(keys.find(kid).cloned())
    }

    async fn load(&self, slot: &mut Option<Snapshot>) -> Result<Arc<JwkSet>, KeySetError> {
        let keys = Arc::new(self.source.fetch().await?);
        info!(keys = keys.keys.len(), "signing key set loaded");
        *slot = Some(Snapshot {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}
