//! The Room Directory (§4.9): the process-wide registry of active rooms.
//! Grounded in the teacher's `GameState` actor in `main.rs`, generalized from
//! a single global match counter into a registry of many concurrently
//! running `RoomEngine` actors. Owns nothing about game rules — only the
//! `RoomId -> RoomEngineProxy` map and the bookkeeping needed to create, join,
//! list, and close rooms.

use crate::client::ClientControllerProxy;
use crate::room::{RoomEngine, RoomEngineProxy};
use anyhow::{anyhow, Result};
use mahjong::config::RoomConfig;
use mahjong::messages::{RoomId, RoomSummary};
use mahjong::player::ConnectionId;
use mahjong::tile::Wind;
use std::collections::BTreeMap;
use thespian::Actor;
use tracing::*;

#[derive(Debug, Default, Actor)]
pub struct RoomDirectory {
    rooms: BTreeMap<RoomId, RoomEngineProxy>,
    next_room_id: u32,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Default::default()
    }
}

#[thespian::actor]
impl RoomDirectory {
    /// Allocates a `RoomId`, spawns a fresh `RoomEngine` actor for it, and
    /// registers the proxy so future joins/lists can find it.
    #[tracing::instrument(skip(self))]
    pub async fn create_room(&mut self, config: RoomConfig) -> Result<(RoomId, RoomEngineProxy)> {
        config.validate().map_err(|err| anyhow!(err.to_string()))?;

        self.next_room_id += 1;
        let id = RoomId::new(self.next_room_id);

        let directory = self.proxy();
        let stage = RoomEngine::new(id, config, directory).into_stage();
        let proxy = stage.proxy();
        tokio::spawn(stage.run());

        self.rooms.insert(id, proxy.clone());
        info!(room = %id, "Room created");
        Ok((id, proxy))
    }

    /// Looks up `room_id` and forwards the join, returning the assigned seat
    /// and a proxy the caller can hold on to for the rest of the session.
    #[tracing::instrument(skip(self, client))]
    pub async fn join_room(
        &mut self,
        room_id: RoomId,
        name: String,
        connection: ConnectionId,
        client: ClientControllerProxy,
    ) -> Result<(Wind, RoomEngineProxy)> {
        let mut room = self.rooms.get(&room_id).cloned().ok_or_else(|| anyhow!("room {} not found", room_id))?;
        let seat = room.join(name, connection, client).await?;
        Ok((seat, room))
    }

    /// A lobby-facing snapshot built by querying every registered room, used
    /// to answer `ListRooms` and to drive the lobby broadcast on room-set
    /// changes.
    #[tracing::instrument(skip(self))]
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::with_capacity(self.rooms.len());
        for room in self.rooms.values() {
            let mut room = room.clone();
            if let Ok(summary) = room.summary().await {
                summaries.push(summary);
            }
        }
        summaries
    }

    /// Deregisters a room. Invoked by a room's own empty-room timer, or after
    /// a failed rematch's teardown — either way the request originates from
    /// inside the room itself, never from a client directly.
    #[tracing::instrument(skip(self))]
    pub async fn close(&mut self, room_id: RoomId) -> Result<()> {
        if self.rooms.remove(&room_id).is_some() {
            info!(room = %room_id, "Room closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_directory_starts_empty() {
        let directory = RoomDirectory::new();
        assert!(directory.rooms.is_empty());
    }
}
