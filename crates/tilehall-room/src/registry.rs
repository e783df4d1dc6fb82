//! Room registry: creates, finds and removes rooms by code.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tilehall_protocol::{PlayerId, RoomCode, RoomListEntry};
use tilehall_session::{LinkId, PlayerSession};
use tokio::sync::RwLock;

use crate::actor::spawn_room;
use crate::{ClaimPolicy, NoClaims, Room, RoomConfig, RoomError, RoomHandle};

/// Every live room, keyed by code.
///
/// Holds handles only; each room's state lives in its actor. The lock is
/// never held across a call into a room.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, RoomHandle>>,
    config: RoomConfig,
    policy: Arc<dyn ClaimPolicy>,
}

impl RoomRegistry {
    /// A registry whose rooms never grant claims.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_policy(config, Arc::new(NoClaims))
    }

    /// A registry whose rooms resolve claims with `policy`.
    pub fn with_policy(config: RoomConfig, policy: Arc<dyn ClaimPolicy>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
            policy,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens an empty room under a fresh code.
    pub async fn create(&self, secret: Option<String>) -> RoomHandle {
        self.open(secret, None).await
    }

    /// Opens a room with `founder` already seated as its owner.
    ///
    /// The room is published to the registry only after the founder holds
    /// the first seat, so no concurrent join can take ownership first.
    pub async fn create_seated(
        &self,
        secret: Option<String>,
        founder: PlayerSession,
    ) -> (RoomHandle, PlayerId) {
        let founder_id = founder.id().clone();
        let handle = self.open(secret, Some(founder)).await;
        (handle, founder_id)
    }

    async fn open(&self, secret: Option<String>, founder: Option<PlayerSession>) -> RoomHandle {
        let mut rooms = self.rooms.write().await;
        let code = loop {
            let candidate = generate_room_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let mut room = Room::new(
            code.clone(),
            secret,
            self.config.clone(),
            Arc::clone(&self.policy),
        );
        if let Some(founder) = founder {
            let owner_id = founder.id().clone();
            room.add_player(founder);
            room.set_owner(owner_id);
        }

        let handle = spawn_room(room);
        rooms.insert(code.clone(), handle.clone());
        tracing::info!(room_code = %code, rooms = rooms.len(), "room created");
        handle
    }

    pub async fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Drops a room and stops its actor. Removing an unknown code is a
    /// no-op.
    pub async fn remove(&self, code: &RoomCode) {
        let removed = self.rooms.write().await.remove(code);
        if let Some(handle) = removed {
            let _ = handle.shutdown().await;
            tracing::info!(room_code = %code, "room removed");
        }
    }

    /// Snapshot of every room handle.
    pub async fn list(&self) -> Vec<RoomHandle> {
        self.rooms.read().await.values().cloned().collect()
    }

    /// Lobby rows for every responsive room, ordered by code.
    pub async fn summaries(&self) -> Vec<RoomListEntry> {
        let handles = self.list().await;
        let mut entries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(entry) = handle.summary().await {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Takes a player out of a room and drops the room once it's empty.
    ///
    /// Safe to call more than once for the same departure: later calls
    /// find no seat (or no room) and change nothing.
    pub async fn depart(&self, code: &RoomCode, player_id: &PlayerId) -> Result<usize, RoomError> {
        let remaining = self.handle(code).await?.leave(player_id.clone()).await?;
        self.drop_if_empty(code, remaining).await;
        Ok(remaining)
    }

    /// Like [`depart`](Self::depart), for a connection that has ended.
    ///
    /// If the player has reconnected since `link` was attached this is
    /// [`RoomError::Superseded`] and the player keeps their seat.
    pub async fn disconnect(
        &self,
        code: &RoomCode,
        player_id: &PlayerId,
        link: LinkId,
    ) -> Result<usize, RoomError> {
        let remaining = self
            .handle(code)
            .await?
            .disconnect(player_id.clone(), link)
            .await?;
        self.drop_if_empty(code, remaining).await;
        Ok(remaining)
    }

    /// Releases a seat whose player never connected, dropping the room if
    /// that empties it. `Ok(None)` if the player did connect.
    pub async fn expire_unconnected(
        &self,
        code: &RoomCode,
        player_id: &PlayerId,
    ) -> Result<Option<usize>, RoomError> {
        let released = self
            .handle(code)
            .await?
            .expire_unconnected(player_id.clone())
            .await?;
        if let Some(remaining) = released {
            self.drop_if_empty(code, remaining).await;
        }
        Ok(released)
    }

    async fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.get(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    async fn drop_if_empty(&self, code: &RoomCode, remaining: usize) {
        if remaining == 0 {
            self.remove(code).await;
        }
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

/// A random code of [`RoomCode::LEN`] characters from [`RoomCode::ALPHABET`].
fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code = (0..RoomCode::LEN)
        .map(|_| {
            let i = rng.random_range(0..RoomCode::ALPHABET.len());
            char::from(RoomCode::ALPHABET[i])
        })
        .collect();
    RoomCode(code)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_room_code_shape() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert!(RoomCode::is_valid(code.as_str()), "{code}");
        }
    }

    #[test]
    fn test_generate_room_code_varies() {
        let codes: HashSet<RoomCode> = (0..50).map(|_| generate_room_code()).collect();
        assert!(codes.len() > 45);
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = RoomRegistry::default();
        let handle = registry.create(None).await;
        let code = handle.code().clone();

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&code).await.is_some());

        registry.remove(&code).await;
        assert!(registry.get(&code).await.is_none());
        assert!(registry.is_empty().await);

        // Idempotent.
        registry.remove(&code).await;
    }

    #[tokio::test]
    async fn test_create_gives_distinct_codes() {
        let registry = RoomRegistry::default();
        let mut codes = HashSet::new();
        for _ in 0..20 {
            codes.insert(registry.create(None).await.code().clone());
        }
        assert_eq!(codes.len(), 20);
        assert_eq!(registry.list().await.len(), 20);
    }

    #[tokio::test]
    async fn test_create_seated_publishes_with_owner() {
        let registry = RoomRegistry::default();
        let (handle, founder) = registry
            .create_seated(Some("abc".into()), PlayerSession::create("alice"))
            .await;

        let info = handle.info().await.unwrap();
        assert_eq!(info.players.len(), 1);
        assert_eq!(info.owner.map(|o| o.id), Some(founder));
    }

    #[tokio::test]
    async fn test_expire_unconnected_removes_emptied_room() {
        let registry = RoomRegistry::default();
        let (handle, founder) = registry
            .create_seated(None, PlayerSession::create("alice"))
            .await;
        let code = handle.code().clone();

        assert_eq!(registry.expire_unconnected(&code, &founder).await, Ok(Some(0)));
        assert!(registry.is_empty().await);
        assert!(matches!(
            registry.expire_unconnected(&code, &founder).await,
            Err(RoomError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_depart_unknown_room() {
        let registry = RoomRegistry::default();
        let result = registry
            .depart(&RoomCode::from("NOPE22"), &PlayerId::from("p"))
            .await;
        assert!(matches!(result, Err(RoomError::NotFound(_))));
    }
}
