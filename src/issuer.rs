use std::sync::Arc;

use uuid::Uuid;

use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::discord::DiscordClient;
use crate::error::AppError;
use crate::models::invite::{InviteRecord, VALIDITY_BUFFER_MS};

/// Upstream lifetime requested for every minted code.
pub const INVITE_MAX_AGE_SECS: i64 = 120;

/// Every code is single-use; the upstream enforces it per code, which is what
/// makes the unlocked read/issue race between concurrent same-id requests
/// harmless (both get distinct valid codes, last cache write wins).
const INVITE_MAX_USES: u32 = 1;

pub fn cache_key(uuid: &str) -> String {
    format!("invite:{uuid}")
}

pub struct IssuedInvite {
    pub record: InviteRecord,
    pub cached: bool,
}

enum CacheOutcome {
    HitValid(InviteRecord),
    HitStale(InviteRecord),
    Miss,
    Unavailable,
}

pub struct Issuer {
    cache: Arc<dyn CacheStore>,
    discord: DiscordClient,
    clock: Arc<dyn Clock>,
}

impl Issuer {
    pub fn new(cache: Arc<dyn CacheStore>, discord: DiscordClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            discord,
            clock,
        }
    }

    /// Resolve a request for an invite: serve a still-viable cached record for
    /// the caller's identifier, otherwise mint a new code upstream and cache
    /// it for the rest of its lifetime.
    pub async fn handle(&self, client_id: Option<String>) -> Result<IssuedInvite, AppError> {
        let (uuid, supplied) = match client_id {
            Some(id) => (id, true),
            None => (Uuid::new_v4().to_string(), false),
        };

        // Only a caller-supplied identifier can have history worth consulting.
        if supplied {
            match self.consult_cache(&uuid).await {
                CacheOutcome::HitValid(record) => {
                    tracing::debug!("serving cached invite for {uuid}");
                    return Ok(IssuedInvite {
                        record,
                        cached: true,
                    });
                }
                CacheOutcome::HitStale(stale) => {
                    tracing::debug!(
                        "invite for {uuid} expiring at {} is no longer viable, reissuing",
                        stale.expires_at
                    );
                    // Best effort; the store's own TTL cleans up after us.
                    if let Err(e) = self.cache.delete(&cache_key(&uuid)).await {
                        tracing::warn!("failed to evict stale invite for {uuid}: {e}");
                    }
                }
                CacheOutcome::Miss | CacheOutcome::Unavailable => {}
            }
        }

        let code = self
            .discord
            .create_invite(INVITE_MAX_AGE_SECS as u32, INVITE_MAX_USES)
            .await?;

        let now = self.clock.now_ms();
        let record = InviteRecord {
            uuid,
            code,
            created_at: now,
            expires_at: now + INVITE_MAX_AGE_SECS * 1_000,
        };

        // A fresh, valid invite is the answer whether or not caching it works.
        self.persist(&record, now).await;

        Ok(IssuedInvite {
            record,
            cached: false,
        })
    }

    async fn consult_cache(&self, uuid: &str) -> CacheOutcome {
        let raw = match self.cache.get(&cache_key(uuid)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheOutcome::Miss,
            Err(e) => {
                tracing::warn!("cache lookup failed for {uuid}: {e}");
                return CacheOutcome::Unavailable;
            }
        };

        let record: InviteRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("undecodable cache entry for {uuid}: {e}");
                return CacheOutcome::Unavailable;
            }
        };

        if record.is_valid(self.clock.now_ms(), VALIDITY_BUFFER_MS) {
            CacheOutcome::HitValid(record)
        } else {
            CacheOutcome::HitStale(record)
        }
    }

    async fn persist(&self, record: &InviteRecord, now_ms: i64) {
        let ttl_secs = ((record.expires_at - now_ms) / 1_000).max(0) as u64;
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("failed to encode invite for {}: {e}", record.uuid);
                return;
            }
        };
        if let Err(e) = self
            .cache
            .put(&cache_key(&record.uuid), &value, ttl_secs)
            .await
        {
            tracing::warn!("failed to cache invite for {}: {e}", record.uuid);
        }
    }
}
