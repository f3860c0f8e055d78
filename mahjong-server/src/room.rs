//! The Room Engine: one actor per room, owning the player records, the
//! round/match state, timers, and the connection set attached to it (§4.7).
//! Every externally-originated action (a client's `ClientAction`, a timer
//! fire, a disconnect) enters through this actor's mailbox, so "single
//! logical serial worker per room" falls straight out of `thespian` rather
//! than needing a hand-rolled mutex (§5).

use crate::client::ClientControllerProxy;
use crate::directory::RoomDirectoryProxy;
use anyhow::{anyhow, bail, Result};
use mahjong::ai;
use mahjong::claim::ClaimDecision;
use mahjong::config::RoomConfig;
use mahjong::error::ActionError;
use mahjong::match_state::{MatchId, MatchState, RematchVote};
use mahjong::messages::{AnnouncementKind, LobbySeat, RoomId, RoomSummary, ServerMessage};
use mahjong::player::{ConnectionId, PlayerRecord};
use mahjong::projection;
use mahjong::round::{Phase, RoundOutcome};
use mahjong::rules;
use mahjong::scoring::BaselineScoring;
use mahjong::tile::Wind;
use mahjong::timer::{TimerKind, TimerRegistry};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;
use thespian::Actor;
use tracing::*;

const ALL_SEATS: [Wind; 4] = [Wind::East, Wind::South, Wind::West, Wind::North];

/// An AI decision that's been scheduled behind an `AiThink` delay but not yet
/// applied, so a late fire can check "am I still the seat to act in the
/// expected phase?" (§4.6) before mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAi {
    /// `seat` is AI and the current turn, either about to draw (or declare a
    /// concealed kong in place of drawing) or about to act on its just-drawn
    /// tile.
    Turn { seat: Wind },
    /// `seat` is AI and eligible to respond to the live discard.
    Claim { seat: Wind },
}

#[derive(Debug, Actor)]
pub struct RoomEngine {
    id: RoomId,
    config: RoomConfig,
    rng: Pcg64Mcg,
    directory: RoomDirectoryProxy,

    /// Seats before the match has started. Moved into `match_` on `StartGame`.
    lobby_seats: BTreeMap<Wind, PlayerRecord>,
    connections: BTreeMap<Wind, ClientControllerProxy>,
    match_: Option<MatchState>,
    next_match_id: u32,

    host: Option<Wind>,
    timers: TimerRegistry,
    next_round_confirmations: BTreeSet<Wind>,
    message_log: VecDeque<(Wind, String, String)>,
    /// The single in-flight AI decision waiting out its think delay, if any
    /// (§4.5, §4.6's `ai-think` row). Only one AI seat thinks at a time,
    /// mirroring the timer subsystem's single `AiThink` slot.
    pending_ai: Option<PendingAi>,
}

impl RoomEngine {
    pub fn new(id: RoomId, config: RoomConfig, directory: RoomDirectoryProxy) -> Self {
        RoomEngine {
            id,
            config,
            rng: Pcg64Mcg::from_entropy(),
            directory,
            lobby_seats: BTreeMap::new(),
            connections: BTreeMap::new(),
            match_: None,
            next_match_id: 1,
            host: None,
            timers: TimerRegistry::default(),
            next_round_confirmations: BTreeSet::new(),
            message_log: VecDeque::new(),
            pending_ai: None,
        }
    }

    fn seats(&self) -> &BTreeMap<Wind, PlayerRecord> {
        match &self.match_ {
            Some(m) => &m.seats,
            None => &self.lobby_seats,
        }
    }

    fn seats_mut(&mut self) -> &mut BTreeMap<Wind, PlayerRecord> {
        match &mut self.match_ {
            Some(m) => &mut m.seats,
            None => &mut self.lobby_seats,
        }
    }

    fn lowest_unused_seat(&self) -> Option<Wind> {
        ALL_SEATS.into_iter().find(|seat| !self.seats().contains_key(seat))
    }

    fn online_human_count(&self) -> usize {
        self.seats().values().filter(|record| record.is_human && record.is_online).count()
    }

    /// Implements the §4.7 reconnection rule: same-connection rejoin, then
    /// same-name reclaim of an offline seat, then lowest unused seat.
    fn assign_seat(&mut self, name: &str, connection: ConnectionId) -> Result<Wind> {
        if let Some((&seat, _)) =
            self.seats().iter().find(|(_, record)| record.connection == Some(connection))
        {
            return Ok(seat);
        }

        if let Some((&seat, _)) = self
            .seats()
            .iter()
            .find(|(_, record)| record.is_human && !record.is_online && record.name == name)
        {
            let record = self.seats_mut().get_mut(&seat).expect("found above");
            record.reconnect(connection);
            record.name = name.to_owned();
            return Ok(seat);
        }

        let seat = self.lowest_unused_seat().ok_or_else(|| anyhow!("room is full"))?;
        self.seats_mut().insert(seat, PlayerRecord::new_human(name.to_owned(), connection));
        if self.host.is_none() {
            self.host = Some(seat);
            if let Some(record) = self.seats_mut().get_mut(&seat) {
                record.is_host = true;
            }
        }
        Ok(seat)
    }
}

#[thespian::actor]
impl RoomEngine {
    #[tracing::instrument(skip(self, client))]
    pub async fn join(&mut self, name: String, connection: ConnectionId, client: ClientControllerProxy) -> Result<Wind> {
        if self.match_.is_none() && self.lobby_seats.len() >= 4 {
            bail!("room is full");
        }

        let seat = self.assign_seat(&name, connection)?;
        self.connections.insert(seat, client);
        self.timers.clear(TimerKind::EmptyRoom);

        info!(room = %self.id, %seat, "Client joined room");
        self.broadcast().await;
        Ok(seat)
    }

    #[tracing::instrument(skip(self))]
    pub async fn leave(&mut self, seat: Wind) -> Result<()> {
        self.connections.remove(&seat);
        if let Some(record) = self.seats_mut().get_mut(&seat) {
            record.mark_offline();
        }

        if Some(seat) == self.host {
            self.host = self
                .seats()
                .iter()
                .find(|(_, record)| record.is_human && record.is_online)
                .map(|(&seat, _)| seat);
            for (s, record) in self.seats_mut().iter_mut() {
                record.is_host = Some(*s) == self.host;
            }
        }

        if self.online_human_count() == 0 {
            match &self.match_ {
                // §4.7: a room that empties mid-round tears down right away
                // rather than waiting out the empty-room grace period.
                Some(m) if !m.match_over => {
                    info!(room = %self.id, "Room emptied of online humans during active play, closing");
                    self.directory.close(self.id).await?;
                    return Ok(());
                }
                Some(_) => self.start_empty_room_timer(self.config.empty_room_ended_timeout_secs),
                None => self.start_empty_room_timer(self.config.empty_room_active_timeout_secs),
            }
        }

        self.broadcast().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_game(&mut self, seat: Wind) -> Result<(), ActionError> {
        if self.match_.is_some() {
            return Err(ActionError::InvalidTiming);
        }
        if Some(seat) != self.host {
            return Err(ActionError::InvalidTiming);
        }
        if (self.lobby_seats.values().filter(|r| r.is_human).count() as u8) < self.config.human_target {
            return Err(ActionError::InvalidTiming);
        }

        if self.config.fill_with_ai {
            for (i, wind) in ALL_SEATS.into_iter().enumerate() {
                self.lobby_seats.entry(wind).or_insert_with(|| PlayerRecord::new_ai(format!("AI {}", i + 1)));
            }
        } else if self.lobby_seats.len() < 4 {
            return Err(ActionError::InvalidTiming);
        }

        let seats = std::mem::take(&mut self.lobby_seats);
        let match_id = MatchId::new(self.next_match_id);
        self.next_match_id += 1;
        let match_state = MatchState::new(match_id, seats, self.config.num_rounds, self.config.copies_per_kind, &mut self.rng);
        self.match_ = Some(match_state);
        self.start_round_cap_timer();

        info!(room = %self.id, "Match started");
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn draw(&mut self, seat: Wind) -> Result<(), ActionError> {
        let round = &mut self.active_match()?.round;
        round.draw(seat)?;
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn discard(&mut self, seat: Wind, tile: mahjong::tile::TileId) -> Result<(), ActionError> {
        let m = self.active_match()?;
        m.round.discard(seat, &mut m.seats, tile)?;
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn declare_hu(&mut self, seat: Wind) -> Result<(), ActionError> {
        let m = self.active_match()?;
        let won = m.round.self_drawn_hu(seat, &mut m.seats, &BaselineScoring)?;
        if !won {
            self.start_turn_timer();
            self.broadcast().await;
            return Err(ActionError::FalseHu);
        }
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn declare_an_gang(&mut self, seat: Wind, kind: mahjong::tile::Kind) -> Result<(), ActionError> {
        let m = self.active_match()?;
        m.round.an_gang(seat, kind, &mut m.seats)?;
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn declare_add_gang(&mut self, seat: Wind, kind: mahjong::tile::Kind) -> Result<(), ActionError> {
        let m = self.active_match()?;
        m.round.add_gang(seat, kind, &mut m.seats)?;
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn submit_claim_decision(&mut self, seat: Wind, decision: ClaimDecision) -> Result<(), ActionError> {
        let m = self.active_match()?;
        m.round.submit_claim(seat, decision)?;
        self.run_engine().await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn confirm_next_round(&mut self, seat: Wind) -> Result<(), ActionError> {
        {
            let m = self.active_match()?;
            if !matches!(m.round.phase, Phase::Settled { .. }) {
                return Err(ActionError::InvalidTiming);
            }
        }
        self.next_round_confirmations.insert(seat);
        let all_confirmed = self
            .seats()
            .iter()
            .filter(|(_, record)| record.is_online && record.is_human)
            .all(|(s, _)| self.next_round_confirmations.contains(s));

        if all_confirmed {
            self.advance_round_or_finish().await;
        } else {
            self.broadcast().await;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn vote_rematch(&mut self, seat: Wind, vote: RematchVote) -> Result<(), ActionError> {
        let m = self.active_match()?;
        if !m.match_over {
            return Err(ActionError::InvalidTiming);
        }
        m.record_rematch_vote(seat, vote);

        if m.rematch_agreed() {
            self.start_rematch().await;
        } else if m.all_online_seats_voted() {
            self.close_after_failed_rematch().await;
        } else {
            self.broadcast().await;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn send_chat(&mut self, seat: Wind, text: String) -> Result<()> {
        let name = self.seats().get(&seat).map(|r| r.name.clone()).unwrap_or_default();
        if self.message_log.len() >= self.config.max_message_log_entries {
            self.message_log.pop_front();
        }
        self.message_log.push_back((seat, name.clone(), text.clone()));

        self.push_all(ServerMessage::Chat { seat, name, text }).await;
        Ok(())
    }

    pub async fn summary(&self) -> RoomSummary {
        let human_count = self.seats().values().filter(|r| r.is_human && r.is_online).count() as u8;
        let phase_label = match &self.match_ {
            Some(m) if m.match_over => "AwaitingRematchVotes".into(),
            Some(m) => projection_phase_label(&m.round.phase),
            None => "WaitingForPlayers".into(),
        };
        RoomSummary {
            id: self.id,
            name: self.config.room_name.clone(),
            human_count,
            human_target: self.config.human_target,
            phase_label,
        }
    }

    /// Invoked by a scheduled timer's fire. A stale fire (superseded by a
    /// newer timer of the same family) recognizes itself via the generation
    /// counter and no-ops.
    #[tracing::instrument(skip(self))]
    pub async fn timer_fired(&mut self, kind: TimerKind, generation: u64) -> Result<()> {
        if !self.timers.is_current(kind, generation) {
            return Ok(());
        }

        match kind {
            TimerKind::Turn => self.force_discard_current_seat().await,
            TimerKind::ClaimGlobal => self.run_engine().await,
            TimerKind::NextRound => self.advance_round_or_finish().await,
            TimerKind::Rematch => self.close_after_failed_rematch().await,
            TimerKind::RoundCap => self.settle_as_exhaustive_draw().await,
            TimerKind::AiThink => self.apply_pending_ai().await,
            TimerKind::EmptyRoom => {
                info!(room = %self.id, "Room empty-room watchdog fired, closing");
                let _ = self.directory.close(self.id).await;
            }
        }
        Ok(())
    }
}

impl RoomEngine {
    fn active_match(&mut self) -> Result<&mut MatchState, ActionError> {
        self.match_.as_mut().ok_or(ActionError::InvalidTiming)
    }

    /// Drives AI turns and claim decisions to completion, starting the
    /// appropriate timer and broadcasting once control sits with a human
    /// seat or the round settles (§5: "no rule step yields mid-mutation";
    /// this loop is the synchronous drive between suspension points).
    async fn run_engine(&mut self) {
        loop {
            // A phase transition taken via some path other than this AI's own
            // think-delay fire (round-cap, a forced discard, claim
            // resolution, a fresh deal, ...) can strand a still-scheduled
            // `AiThink` timer pointing at a seat/phase that no longer
            // applies. Reconcile eagerly rather than waiting for that timer
            // to fire and discover the same thing in `apply_pending_ai`.
            if let Some(pending) = self.pending_ai {
                if !self.pending_ai_is_valid(pending) {
                    self.pending_ai = None;
                    self.timers.clear(TimerKind::AiThink);
                }
            }

            let m = match &mut self.match_ {
                Some(m) => m,
                None => return,
            };

            match m.round.phase.clone() {
                Phase::AwaitingDraw { turn } => {
                    if self.is_ai(turn) {
                        if self.pending_ai.is_none() {
                            self.schedule_ai_think(PendingAi::Turn { seat: turn });
                        }
                        break;
                    }
                    self.start_turn_timer();
                    break;
                }
                Phase::AwaitingDiscard { turn } => {
                    if self.is_ai(turn) {
                        if self.pending_ai.is_none() {
                            self.schedule_ai_think(PendingAi::Turn { seat: turn });
                        }
                        break;
                    }
                    self.start_turn_timer();
                    break;
                }
                Phase::CollectingClaims { eligible, responded, .. } => {
                    let next_ai_claimant =
                        eligible.keys().find(|&&seat| self.is_ai(seat) && !responded.contains_key(&seat)).copied();

                    if let Some(seat) = next_ai_claimant {
                        if self.pending_ai.is_none() {
                            self.schedule_ai_think(PendingAi::Claim { seat });
                        }
                        break;
                    }

                    let m = self.match_.as_mut().unwrap();
                    if m.round.all_claims_in() {
                        self.resolve_current_claims();
                        continue;
                    }
                    self.start_claim_timer();
                    break;
                }
                Phase::Settled { .. } => {
                    self.next_round_confirmations.clear();
                    self.timers.clear(TimerKind::Turn);
                    self.timers.clear(TimerKind::ClaimGlobal);
                    self.timers.clear(TimerKind::RoundCap);
                    // §4.8: reaching the configured round total opens the
                    // rematch vote instead of counting down to a next deal.
                    if m.match_over {
                        self.start_rematch_timer();
                    } else {
                        self.start_next_round_timer();
                    }
                    break;
                }
            }
        }

        self.broadcast().await;
    }

    fn is_ai(&self, seat: Wind) -> bool {
        self.seats().get(&seat).map(|r| !r.is_human).unwrap_or(true)
    }

    fn run_ai_draw(&mut self, turn: Wind) {
        let m = self.match_.as_mut().expect("checked by caller");
        let _ = m.round.draw(turn);
    }

    fn run_ai_discard(&mut self, turn: Wind) {
        let m = self.match_.as_mut().expect("checked by caller");
        let drawn = match m.round.drawn_tile {
            Some(tile) => tile,
            None => return,
        };
        let record = &m.seats[&turn];
        let action = ai::self_drawn(&record.hand, &record.melds, drawn, &m.round.discard_pile);

        match action {
            ai::SelfDrawnAction::Hu => {
                let _ = m.round.self_drawn_hu(turn, &mut m.seats, &BaselineScoring);
            }
            ai::SelfDrawnAction::ConcealedKong(kind) => {
                let _ = m.round.an_gang(turn, kind, &mut m.seats);
            }
            ai::SelfDrawnAction::AddGang(kind) => {
                let _ = m.round.add_gang(turn, kind, &mut m.seats);
            }
            ai::SelfDrawnAction::Discard(tile) => {
                let _ = m.round.discard(turn, &mut m.seats, tile.id);
            }
        }
    }

    /// Builds the hu-validity closure from a snapshot taken before the
    /// mutable resolution call, since `finish_claim_resolution` needs `&mut
    /// seats` for the same map the closure would otherwise have to borrow.
    fn resolve_current_claims(&mut self) {
        let m = self.match_.as_mut().expect("checked by caller");
        let discard = match m.round.current_discard() {
            Some(tile) => tile,
            None => return,
        };

        let validity: BTreeMap<Wind, bool> = m
            .seats
            .iter()
            .map(|(&seat, record)| {
                let mut hypothetical = record.hand.clone();
                hypothetical.push(discard);
                (seat, rules::check_win(&hypothetical, &record.melds))
            })
            .collect();

        let _ = m.round.finish_claim_resolution(
            &mut m.seats,
            move |seat| validity.get(&seat).copied().unwrap_or(false),
            &BaselineScoring,
        );
    }

    async fn force_discard_current_seat(&mut self) {
        let seat = match &self.match_ {
            Some(m) => match &m.round.phase {
                Phase::AwaitingDiscard { turn } => Some(*turn),
                Phase::AwaitingDraw { turn } => Some(*turn),
                _ => None,
            },
            None => None,
        };

        if let Some(seat) = seat {
            let m = self.match_.as_mut().unwrap();
            if matches!(m.round.phase, Phase::AwaitingDraw { .. }) {
                let _ = m.round.draw(seat);
            }
            let m = self.match_.as_mut().unwrap();
            if let Some(drawn) = m.round.drawn_tile {
                let _ = m.round.discard(seat, &mut m.seats, drawn.id);
            } else if let Some(record) = m.seats.get(&seat) {
                if let Some(rightmost) = record.hand.last().copied() {
                    let _ = m.round.discard(seat, &mut m.seats, rightmost.id);
                }
            }
        }

        self.run_engine().await;
    }

    async fn settle_as_exhaustive_draw(&mut self) {
        if let Some(m) = &mut self.match_ {
            if !matches!(m.round.phase, Phase::Settled { .. }) {
                m.round.settle_exhaustive_draw(&mut m.seats, &BaselineScoring);
            }
        }
        self.run_engine().await;
    }

    async fn advance_round_or_finish(&mut self) {
        let m = match &mut self.match_ {
            Some(m) => m,
            None => return,
        };
        let outcome = match &m.round.phase {
            Phase::Settled { outcome } => outcome.clone(),
            _ => return,
        };

        self.next_round_confirmations.clear();
        m.advance_round(outcome, self.config.copies_per_kind, &mut self.rng);
        if !self.match_.as_ref().map(|m| m.match_over).unwrap_or(true) {
            self.start_round_cap_timer();
        }
        self.run_engine().await;
    }

    async fn start_rematch(&mut self) {
        let m = match &mut self.match_ {
            Some(m) => m,
            None => return,
        };

        let mut carried = BTreeMap::new();
        for (&seat, record) in m.seats.iter() {
            let keep_human = record.is_human && matches!(m.rematch_votes.get(&seat), Some(RematchVote::StayForRematch));
            if !record.is_human || keep_human {
                carried.insert(seat, record.clone());
            }
        }
        for (i, wind) in ALL_SEATS.into_iter().enumerate() {
            carried.entry(wind).or_insert_with(|| PlayerRecord::new_ai(format!("AI {}", i + 1)));
        }

        let prior_host_stayed = self.host.map(|seat| carried.get(&seat).map(|r| r.is_human).unwrap_or(false)).unwrap_or(false);
        let new_host = if prior_host_stayed { self.host } else { carried.iter().find(|(_, r)| r.is_human).map(|(&s, _)| s) };
        for (seat, record) in carried.iter_mut() {
            record.is_host = Some(*seat) == new_host;
            record.mark_offline();
        }
        for (&seat, proxy) in self.connections.iter() {
            if let Some(record) = carried.get_mut(&seat) {
                if let Some(connection) = self.seats().get(&seat).and_then(|r| r.connection) {
                    record.reconnect(connection);
                }
                let _ = proxy;
            }
        }
        self.host = new_host;

        let match_id = MatchId::new(self.next_match_id);
        self.next_match_id += 1;
        m.seats = carried;
        m.start_rematch(match_id, self.config.copies_per_kind, &mut self.rng);
        // The rematch-vote timer this replaces doesn't get superseded for
        // free if the freshly dealt dealer is AI: that path schedules an
        // independent `AiThink` timer rather than a family one, which would
        // otherwise leave the old `Rematch` generation looking current.
        self.timers.clear(TimerKind::Rematch);
        self.start_round_cap_timer();

        info!(room = %self.id, "Rematch started");
        self.run_engine().await;
    }

    async fn close_after_failed_rematch(&mut self) {
        info!(room = %self.id, "Rematch not unanimous, closing room");
        let _ = self.directory.close(self.id).await;
    }

    /// Schedules `pending` behind a random think delay (§4.5) instead of
    /// applying it immediately, so AI moves are paced for human observers.
    fn schedule_ai_think(&mut self, pending: PendingAi) {
        self.pending_ai = Some(pending);
        let ms = ai::think_delay_ms(&mut self.rng, self.config.ai_think_min_ms, self.config.ai_think_max_ms);
        let duration = Duration::from_millis(ms);
        let generation = self.timers.start(TimerKind::AiThink, duration);
        self.schedule(TimerKind::AiThink, generation, duration);
    }

    /// Whether `pending` still describes the seat the current phase expects
    /// to act, i.e. whether it's still safe to apply (§4.6: "checks whether
    /// it is still that seat's turn"). Shared by `run_engine`'s eager
    /// reconciliation and `apply_pending_ai`'s own check at fire time.
    fn pending_ai_is_valid(&self, pending: PendingAi) -> bool {
        match (pending, &self.match_) {
            (PendingAi::Turn { seat }, Some(m)) => matches!(
                &m.round.phase,
                Phase::AwaitingDraw { turn } | Phase::AwaitingDiscard { turn } if *turn == seat
            ),
            (PendingAi::Claim { seat }, Some(m)) => matches!(
                &m.round.phase,
                Phase::CollectingClaims { eligible, responded, .. }
                    if eligible.contains_key(&seat) && !responded.contains_key(&seat)
            ),
            (_, None) => false,
        }
    }

    /// Applies the AI decision that was waiting out its think delay, unless
    /// the seat is no longer the one expected to act in the phase it was
    /// scheduled for. A human action that moved the phase along in the
    /// meantime effectively cancels this invocation.
    async fn apply_pending_ai(&mut self) {
        let pending = match self.pending_ai.take() {
            Some(pending) => pending,
            None => return,
        };

        if self.pending_ai_is_valid(pending) {
            match pending {
                PendingAi::Turn { seat } => match self.match_.as_ref().unwrap().round.phase.clone() {
                    Phase::AwaitingDraw { .. } => self.run_ai_draw(seat),
                    Phase::AwaitingDiscard { .. } => self.run_ai_discard(seat),
                    _ => {}
                },
                PendingAi::Claim { seat } => {
                    let m = self.match_.as_mut().unwrap();
                    let options = match &m.round.phase {
                        Phase::CollectingClaims { eligible, .. } => eligible.get(&seat).cloned(),
                        _ => None,
                    };
                    if let Some(options) = options {
                        let decision = ai::claim_decision(&options);
                        let _ = m.round.submit_claim(seat, decision);
                    }
                }
            }
        }

        self.run_engine().await;
    }

    fn start_empty_room_timer(&mut self, secs: u64) {
        let duration = Duration::from_secs(secs);
        let generation = self.timers.start(TimerKind::EmptyRoom, duration);
        self.schedule(TimerKind::EmptyRoom, generation, duration);
    }

    fn start_turn_timer(&mut self) {
        let generation = self.timers.start(TimerKind::Turn, TimerKind::Turn.duration(&self.config));
        self.schedule(TimerKind::Turn, generation, TimerKind::Turn.duration(&self.config));
    }

    fn start_claim_timer(&mut self) {
        let generation = self.timers.start(TimerKind::ClaimGlobal, TimerKind::ClaimGlobal.duration(&self.config));
        self.schedule(TimerKind::ClaimGlobal, generation, TimerKind::ClaimGlobal.duration(&self.config));
    }

    fn start_next_round_timer(&mut self) {
        let generation = self.timers.start(TimerKind::NextRound, TimerKind::NextRound.duration(&self.config));
        self.schedule(TimerKind::NextRound, generation, TimerKind::NextRound.duration(&self.config));
    }

    fn start_rematch_timer(&mut self) {
        let generation = self.timers.start(TimerKind::Rematch, TimerKind::Rematch.duration(&self.config));
        self.schedule(TimerKind::Rematch, generation, TimerKind::Rematch.duration(&self.config));
    }

    /// Started once a fresh round is dealt (§4.2's "start the round-cap
    /// timer" on leaving DEALING). Its own independent slot means it keeps
    /// running underneath however many turn/claim-global restarts happen
    /// over the round rather than getting superseded by them.
    fn start_round_cap_timer(&mut self) {
        let generation = self.timers.start(TimerKind::RoundCap, TimerKind::RoundCap.duration(&self.config));
        self.schedule(TimerKind::RoundCap, generation, TimerKind::RoundCap.duration(&self.config));
    }

    fn schedule(&self, kind: TimerKind, generation: u64, duration: Duration) {
        let mut room = self.proxy();
        tokio::spawn(async move {
            tokio::time::delay_for(duration).await;
            let _ = room.timer_fired(kind, generation).await;
        });
    }

    async fn broadcast(&mut self) {
        if self.match_.is_none() {
            let seats: Vec<LobbySeat> = ALL_SEATS
                .into_iter()
                .map(|seat| match self.lobby_seats.get(&seat) {
                    Some(record) => LobbySeat {
                        seat,
                        name: Some(record.name.clone()),
                        is_human: record.is_human,
                        is_host: record.is_host,
                    },
                    None => LobbySeat { seat, name: None, is_human: false, is_host: false },
                })
                .collect();
            let host_name = self.host.and_then(|seat| self.lobby_seats.get(&seat)).map(|r| r.name.clone());
            self.push_all(ServerMessage::Lobby { seats, host_name, config: self.config.clone() }).await;
            return;
        }

        let m = self.match_.as_ref().unwrap();
        let match_over = m.match_over;
        for (&seat, proxy) in self.connections.clone().iter() {
            let active_timer = self.timers.active_family();
            let view = projection::project(
                &m.round,
                &m.seats,
                Some(seat),
                &self.config,
                active_timer,
                m.round_number,
                m.round_cap,
                match_over,
            );
            let mut proxy = proxy.clone();
            let _ = proxy.push(ServerMessage::ProjectedState(Box::new(view))).await;
        }
    }

    async fn push_all(&mut self, message: ServerMessage) {
        for (_, proxy) in self.connections.clone().iter() {
            let mut proxy = proxy.clone();
            let _ = proxy.push(message.clone()).await;
        }
    }
}

fn projection_phase_label(phase: &Phase) -> String {
    match phase {
        Phase::AwaitingDraw { .. } => "AwaitingDraw".into(),
        Phase::AwaitingDiscard { .. } => "AwaitingDiscard".into(),
        Phase::CollectingClaims { .. } => "CollectingClaims".into(),
        Phase::Settled { outcome: RoundOutcome::ExhaustiveDraw } => "RoundOverDraw".into(),
        Phase::Settled { outcome: RoundOutcome::Win { .. } } => "RoundOverWin".into(),
    }
}

