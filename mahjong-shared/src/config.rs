//! Per-room configuration: the client-supplied knobs a room is created with,
//! validated against the bounds in §6, plus the process-wide player count.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed seat count. Unlike everything else in this module, not configurable
/// per room — the round/claim machinery is written for exactly four seats.
pub const NUM_PLAYERS: usize = 4;

/// Every tunable constant for a single room (§6), supplied by whoever creates
/// it and otherwise defaulted to the spec's baseline values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub room_name: String,
    pub password: Option<String>,
    /// How many human seats the room is reserved for; the remainder fill
    /// with AI immediately if `fill_with_ai`.
    pub human_target: u8,
    pub fill_with_ai: bool,
    pub num_rounds: u32,
    pub copies_per_kind: u32,

    pub claim_decision_timeout_secs: u64,
    pub player_turn_action_timeout_secs: u64,
    pub next_round_countdown_secs: u64,
    pub rematch_vote_timeout_secs: u64,
    pub max_round_duration_secs: u64,
    pub ai_think_min_ms: u64,
    pub ai_think_max_ms: u64,
    pub empty_room_active_timeout_secs: u64,
    pub empty_room_ended_timeout_secs: u64,

    pub max_message_log_entries: usize,
    pub max_room_name_len: usize,
    pub max_password_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        RoomConfig {
            room_name: String::new(),
            password: None,
            human_target: NUM_PLAYERS as u8,
            fill_with_ai: true,
            num_rounds: NUM_PLAYERS as u32,
            copies_per_kind: 4,

            claim_decision_timeout_secs: 10,
            player_turn_action_timeout_secs: 20,
            next_round_countdown_secs: 8,
            rematch_vote_timeout_secs: 30,
            max_round_duration_secs: 30 * 60,
            ai_think_min_ms: 600,
            ai_think_max_ms: 2_200,
            empty_room_active_timeout_secs: 5 * 60,
            empty_room_ended_timeout_secs: 60,

            max_message_log_entries: 200,
            max_room_name_len: 40,
            max_password_len: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("human player target must be between 1 and 4, got {0}")]
    HumanTargetOutOfRange(u8),
    #[error("number of rounds must be at least 1")]
    NoRounds,
    #[error("room name exceeds the {0}-character limit")]
    RoomNameTooLong(usize),
    #[error("password exceeds the {0}-character limit")]
    PasswordTooLong(usize),
}

impl RoomConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.human_target < 1 || self.human_target as usize > NUM_PLAYERS {
            return Err(ConfigError::HumanTargetOutOfRange(self.human_target));
        }
        if self.num_rounds < 1 {
            return Err(ConfigError::NoRounds);
        }
        if self.room_name.len() > self.max_room_name_len {
            return Err(ConfigError::RoomNameTooLong(self.max_room_name_len));
        }
        if let Some(password) = &self.password {
            if password.len() > self.max_password_len {
                return Err(ConfigError::PasswordTooLong(self.max_password_len));
            }
        }
        Ok(())
    }
}
