//! Group roster lookups and admin-role resolution.
//!
//! The messaging layer is reached through [`GroupRoster`]. [`is_admin`] turns
//! a roster lookup into a yes/no answer and never fails: any lookup error
//! resolves to `false`.
//!
//! [`TimeoutRoster`] and [`CachedRoster`] wrap any roster at the collaborator
//! boundary for hosts that need bounded latency or fewer fetches.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use crate::eval::context::local_part;

/// A participant's standing in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    None,
    Admin,
    Superadmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

fn role_or_null<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Role>::deserialize(deserializer)?.unwrap_or_default())
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Participant {
    pub id: String,
    #[serde(default, deserialize_with = "role_or_null")]
    pub role: Role,
}

impl Participant {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Find the roster entry for `participant_id`.
///
/// An exact id wins. Otherwise the single entry sharing the local part under
/// another domain is used; if several share it, none is chosen.
pub fn find_participant<'a>(
    participants: &'a [Participant],
    participant_id: &str,
) -> Option<&'a Participant> {
    if let Some(exact) = participants.iter().find(|p| p.id == participant_id) {
        return Some(exact);
    }
    let wanted = local_part(participant_id);
    let mut same_local = participants.iter().filter(|p| local_part(&p.id) == wanted);
    match (same_local.next(), same_local.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Roster lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// The messaging collaborator: fetches a group's participant list.
#[async_trait]
pub trait GroupRoster: Send + Sync {
    async fn roster(&self, chat_id: &str) -> Result<Vec<Participant>, RosterError>;
}

/// Whether `participant_id` holds an admin or superadmin role in `chat_id`.
///
/// Fails closed: lookup errors and unknown participants yield `false`.
/// Each call queries the roster again; no retry is attempted.
pub async fn is_admin<R>(roster: &R, chat_id: &str, participant_id: &str) -> bool
where
    R: GroupRoster + ?Sized,
{
    match roster.roster(chat_id).await {
        Ok(participants) => {
            find_participant(&participants, participant_id).is_some_and(|p| p.role.is_admin())
        }
        Err(e) => {
            log::warn!("admin lookup for {participant_id} in {chat_id} failed: {e}");
            false
        }
    }
}

// ── Adapters ──

/// In-memory roster keyed by chat id.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    groups: HashMap<String, Vec<Participant>>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the participants of a group.
    pub fn with_group(mut self, chat_id: impl Into<String>, participants: Vec<Participant>) -> Self {
        self.groups.insert(chat_id.into(), participants);
        self
    }
}

#[async_trait]
impl GroupRoster for StaticRoster {
    async fn roster(&self, chat_id: &str) -> Result<Vec<Participant>, RosterError> {
        self.groups
            .get(chat_id)
            .cloned()
            .ok_or_else(|| RosterError::GroupNotFound(chat_id.to_string()))
    }
}

/// Bounds every lookup of the inner roster; expiry becomes [`RosterError::Timeout`].
pub struct TimeoutRoster<R> {
    inner: R,
    limit: Duration,
}

impl<R> TimeoutRoster<R> {
    pub fn new(inner: R, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<R: GroupRoster> GroupRoster for TimeoutRoster<R> {
    async fn roster(&self, chat_id: &str) -> Result<Vec<Participant>, RosterError> {
        tokio::time::timeout(self.limit, self.inner.roster(chat_id))
            .await
            .map_err(|_| RosterError::Timeout(self.limit))?
    }
}

/// Per-chat roster cache. Only successful lookups are stored.
pub struct CachedRoster<R> {
    inner: R,
    entries: RwLock<HashMap<String, Vec<Participant>>>,
}

impl<R> CachedRoster<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop the cached roster of one chat (e.g. after a promote/demote event).
    pub async fn invalidate(&self, chat_id: &str) {
        self.entries.write().await.remove(chat_id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl<R: GroupRoster> GroupRoster for CachedRoster<R> {
    async fn roster(&self, chat_id: &str) -> Result<Vec<Participant>, RosterError> {
        if let Some(hit) = self.entries.read().await.get(chat_id) {
            return Ok(hit.clone());
        }
        // Lock is not held across the fetch; concurrent misses may both fetch.
        let fetched = self.inner.roster(chat_id).await?;
        self.entries
            .write()
            .await
            .insert(chat_id.to_string(), fetched.clone());
        Ok(fetched)
    }
}
