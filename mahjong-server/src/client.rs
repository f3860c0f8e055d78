//! Transport & session glue (§4.10). One `ClientController` actor per
//! connected socket: it performs a lightweight handshake, deserializes
//! incoming `ClientAction` frames, forwards them to the Room Directory or
//! whichever room this connection is currently attached to, and serializes
//! outgoing `ServerMessage`s (pushed by a room's broadcast) back onto the
//! socket. Grounded in the teacher's `ClientController` actor.

use crate::directory::RoomDirectoryProxy;
use crate::room::RoomEngineProxy;
use anyhow::{anyhow, Context, Result};
use futures::{
    prelude::*,
    stream::{SplitSink, SplitStream},
};
use mahjong::messages::{ClientAction, HandshakeRequest, HandshakeResponse, ServerMessage};
use mahjong::player::ConnectionId;
use mahjong::tile::Wind;
use std::sync::atomic::{AtomicU64, Ordering};
use thespian::Actor;
use tracing::*;
use warp::{filters::ws::Message as WsMessage, ws::WebSocket};

/// Actor managing an active session with one connected client.
#[derive(Debug, Actor)]
pub struct ClientController {
    connection: ConnectionId,
    sink: SplitSink<WebSocket, WsMessage>,
    directory: RoomDirectoryProxy,
    state: ClientState,
}

#[derive(Debug, Clone)]
enum ClientState {
    Idle { name: String },
    InRoom { name: String, room: RoomEngineProxy, seat: Wind },
}

impl ClientController {
    /// Performs the handshake (just a display name — authentication is out of
    /// scope, §1) and spawns the actor for the rest of the connection's life.
    #[tracing::instrument(skip(socket, directory))]
    pub async fn perform_handshake(
        connection: ConnectionId,
        socket: WebSocket,
        directory: RoomDirectoryProxy,
    ) -> Result<(ClientControllerProxy, SplitStream<WebSocket>)> {
        let (mut sink, mut stream) = socket.split();

        trace!("Awaiting handshake request");
        let request = stream
            .next()
            .await
            .ok_or_else(|| anyhow!("client disconnected during handshake"))?
            .context("reading handshake request")?;
        let text = request.to_str().map_err(|_| anyhow!("handshake frame was not text: {:?}", request))?;
        let request: HandshakeRequest = serde_json::from_str(text)?;

        let response = HandshakeResponse { connection_id: connection };
        let response = serde_json::to_string(&response).expect("failed to serialize HandshakeResponse");
        sink.send(WsMessage::text(response)).await?;

        info!(%connection, name = %request.name, "Client handshake complete");

        let stage = ClientController {
            connection,
            sink,
            directory,
            state: ClientState::Idle { name: request.name },
        }
        .into_stage();
        let client = stage.proxy();
        tokio::spawn(stage.run());

        Ok((client, stream))
    }

    async fn send(&mut self, message: ServerMessage) -> Result<()> {
        let text = serde_json::to_string(&message).context("serializing server message")?;
        self.sink.send(WsMessage::text(text)).await.context("sending message to client")
    }

    fn name(&self) -> &str {
        match &self.state {
            ClientState::Idle { name } | ClientState::InRoom { name, .. } => name,
        }
    }

    fn room_and_seat(&mut self) -> Result<(&mut RoomEngineProxy, Wind)> {
        match &mut self.state {
            ClientState::InRoom { room, seat, .. } => Ok((room, *seat)),
            ClientState::Idle { .. } => Err(anyhow!("not currently joined to a room")),
        }
    }
}

#[thespian::actor]
impl ClientController {
    /// Pushed by whichever room this connection is attached to, after every
    /// processed action (§4.7: "broadcast the projected state").
    pub async fn push(&mut self, message: ServerMessage) -> Result<()> {
        self.send(message).await
    }

    /// Parses an incoming frame and dispatches it; a rejected action is
    /// reported back to this client alone (§7), never propagated as a socket
    /// error.
    #[tracing::instrument(skip(self, message))]
    pub async fn handle_message(&mut self, message: WsMessage) -> Result<()> {
        let text = message.to_str().map_err(|_| anyhow!("received a non-text message: {:?}", message))?;
        let action: ClientAction = serde_json::from_str(text)?;

        if let Err(err) = self.dispatch(action).await {
            trace!(%err, "Rejecting client action");
            self.send(ServerMessage::ActionRejected { reason: err.to_string() }).await?;
        }
        Ok(())
    }

    /// Called by the socket pump loop the moment the transport closes — the
    /// only place a raw transport error becomes a disconnect notification
    /// (§4.10).
    pub async fn disconnect(&mut self) -> Result<()> {
        if let ClientState::InRoom { room, seat, .. } = &mut self.state {
            let _ = room.leave(*seat).await;
        }
        Ok(())
    }
}

impl ClientController {
    async fn dispatch(&mut self, action: ClientAction) -> Result<()> {
        match action {
            ClientAction::CreateRoom(config) => {
                let name = self.name().to_owned();
                let (_id, mut room) = self.directory.create_room(config).await??;
                let seat = room.join(name.clone(), self.connection, self.proxy()).await??;
                self.state = ClientState::InRoom { name, room, seat };
                Ok(())
            }

            ClientAction::JoinRoom { room_id, name, password: _ } => {
                // TODO: enforce per-room passwords once the directory tracks them.
                let (seat, room) =
                    self.directory.join_room(room_id, name.clone(), self.connection, self.proxy()).await??;
                self.state = ClientState::InRoom { name, room, seat };
                Ok(())
            }

            ClientAction::ListRooms => {
                let rooms = self.directory.list_rooms().await?;
                self.send(ServerMessage::RoomList(rooms)).await
            }

            ClientAction::LeaveRoom => {
                let name = self.name().to_owned();
                if let ClientState::InRoom { room, seat, .. } = &mut self.state {
                    room.leave(*seat).await??;
                }
                self.state = ClientState::Idle { name };
                Ok(())
            }

            ClientAction::StartGame => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.start_game(seat).await??)
            }
            ClientAction::Draw => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.draw(seat).await??)
            }
            ClientAction::Discard { tile } => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.discard(seat, tile).await??)
            }
            ClientAction::DeclareHu => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.declare_hu(seat).await??)
            }
            ClientAction::DeclareAnGang { kind } => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.declare_an_gang(seat, kind).await??)
            }
            ClientAction::DeclareAddGang { kind } => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.declare_add_gang(seat, kind).await??)
            }
            ClientAction::SubmitClaimDecision(decision) => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.submit_claim_decision(seat, decision).await??)
            }
            ClientAction::ConfirmNextRound => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.confirm_next_round(seat).await??)
            }
            ClientAction::VoteRematch(vote) => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.vote_rematch(seat, vote).await??)
            }
            ClientAction::SendChat { text } => {
                let (room, seat) = self.room_and_seat()?;
                Ok(room.send_chat(seat, text).await??)
            }
        }
    }
}

/// Generates process-unique connection ids for newly accepted sockets.
/// Guaranteed unique while a session is active; ids may be reused after
/// enough connections have come and gone.
pub struct ConnectionIdGenerator(AtomicU64);

impl ConnectionIdGenerator {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.0.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for ConnectionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
