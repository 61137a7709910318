use serde::{Deserialize, Serialize};

/// Minimum remaining lifetime (ms) a cached invite must have to be handed out
/// again. Anything closer to expiry than this is regenerated so the caller
/// never receives a code that dies before they can redeem it.
pub const VALIDITY_BUFFER_MS: i64 = 10_000;

/// One issued invitation: the upstream code plus its bookkeeping metadata.
/// Serialized camelCase, both into the cache store and out over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRecord {
    pub uuid: String,
    pub code: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl InviteRecord {
    /// A record is only worth reissuing while strictly more than `buffer_ms`
    /// of its lifetime remains.
    pub fn is_valid(&self, now_ms: i64, buffer_ms: i64) -> bool {
        self.expires_at - now_ms > buffer_ms
    }
}
