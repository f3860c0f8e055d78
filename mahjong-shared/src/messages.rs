//! The wire protocol between a connected client and the room it's in (§6).
//! `ClientAction` is what a client sends; `ServerMessage` is everything a
//! room can push back. Both travel as JSON text frames over the websocket
//! transport.

use crate::claim::ClaimDecision;
use crate::config::RoomConfig;
use crate::match_state::RematchVote;
use crate::player::ConnectionId;
use crate::projection::RoomProjection;
use crate::tile::{Kind, TileId, Wind};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The first frame a client sends after the socket opens, before any room-scoped
/// `ClientAction`. Authentication is out of scope (§1): a display name is all a
/// session carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub name: String,
}

/// The server's reply to a `HandshakeRequest`, handing the client its assigned
/// connection id for the lifetime of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub connection_id: ConnectionId,
}

/// Identifies a room within the Room Directory.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[display("{}", _0)]
#[repr(transparent)]
pub struct RoomId(u32);

impl RoomId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Everything a connected client can ask a room (or the directory) to do.
/// The first four are ambient transport-level actions that don't touch a
/// round in progress; the rest map directly onto the Round/Claim/Match
/// Controller operations (§4.3-§4.4, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientAction {
    CreateRoom(RoomConfig),
    JoinRoom { room_id: RoomId, name: String, password: Option<String> },
    ListRooms,
    LeaveRoom,

    StartGame,
    Draw,
    Discard { tile: TileId },
    DeclareHu,
    DeclareAnGang { kind: Kind },
    DeclareAddGang { kind: Kind },
    SubmitClaimDecision(ClaimDecision),
    ConfirmNextRound,
    VoteRematch(RematchVote),
    SendChat { text: String },
}

/// Everything a room (or the directory) can push to a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Seat occupancy before the match has started (`WaitingForPlayers`).
    Lobby { seats: Vec<LobbySeat>, host_name: Option<String>, config: RoomConfig },
    /// The full projected round state, as seen by this recipient.
    ProjectedState(Box<RoomProjection>),
    ActionAnnouncement { seat: Wind, action: AnnouncementKind },
    Chat { seat: Wind, name: String, text: String },
    RoomList(Vec<RoomSummary>),
    /// A submitted action was rejected (§7); room state is unchanged.
    ActionRejected { reason: String },
}

/// One seat's occupancy, sent while a room is still `WaitingForPlayers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbySeat {
    pub seat: Wind,
    pub name: Option<String>,
    pub is_human: bool,
    pub is_host: bool,
}

/// A human-readable label for an action just taken, broadcast alongside the
/// next `ProjectedState` so clients can animate or log it without having to
/// diff the projection themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementKind {
    Drew,
    Discarded,
    Peng,
    Gang,
    Chi,
    Hu,
    Passed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub human_count: u8,
    pub human_target: u8,
    pub phase_label: String,
}
