//! Session middleware configuration.
//!
//! Visitor sessions hold nothing but the cart snapshot, so they live in an
//! in-process moka cache. Records are evicted when they expire or when the
//! cache is full, least recently used first. A restart empties every cart,
//! the same as a shopper clearing site data.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fasatina_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Most visitor sessions kept at once.
pub const MAX_SESSIONS: u64 = 100_000;

/// The bounded session store.
#[must_use]
pub fn session_store() -> MokaStore {
    MokaStore::new(Some(MAX_SESSIONS))
}

/// Create the session layer over [`session_store`].
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaStore> {
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(session_store())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use tower_sessions::cookie::time::{Duration, OffsetDateTime};
    use tower_sessions::session::{Id, Record};
    use tower_sessions::session_store::SessionStore;

    use super::*;

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::from([("cart".to_string(), serde_json::json!("[]"))]),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_store_keeps_live_sessions() {
        let store = session_store();
        let live = record(Duration::hours(1));

        store.save(&live).await.unwrap();

        let loaded = store.load(&live.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, live.data);
    }

    #[tokio::test]
    async fn test_store_forgets_deleted_sessions() {
        let store = session_store();
        let live = record(Duration::hours(1));

        store.save(&live).await.unwrap();
        store.delete(&live.id).await.unwrap();

        assert!(store.load(&live.id).await.unwrap().is_none());
    }
}
