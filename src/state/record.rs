//! Timer record.
//!
//! One user's game-timer state and the flat document it is persisted as.
//!
//! # Turn Phases
//!
//! ```text
//!                 start_turn(c)
//! ┌──────────┐ ─────────────────▶ ┌────────────┐   pause_turn    ┌────────────┐
//! │ NewGame  │                    │  Ongoing   │ ──────────────▶ │   Paused   │
//! └──────────┘ ◀───────────────── │ (player c) │ ◀────────────── │ (player c) │
//!       ▲          new_game       └─────┬──────┘  continue_turn  └─────┬──────┘
//!       │                               │ start_turn(other)            │ start_turn(c or other)
//!       │                               ▼                              ▼
//!       └──── new_game ────────── Ongoing (other player, previous turn closed)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque color token identifying a player ("red", "green", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerColor(String);

impl PlayerColor {
    pub fn new(color: impl Into<String>) -> Self {
        Self(color.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerColor {
    fn from(color: &str) -> Self {
        Self::new(color)
    }
}

impl From<String> for PlayerColor {
    fn from(color: String) -> Self {
        Self(color)
    }
}

/// Completed-turn time per player.
pub type PlayerTotals = BTreeMap<PlayerColor, Duration>;

/// Coarse status of a timer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnStatus {
    /// No turn has been started since the last reset
    #[default]
    #[serde(rename = "new_game")]
    NewGame,
    /// A player's turn is running
    #[serde(rename = "player_turn")]
    TurnOngoing,
    /// A player's turn is paused
    #[serde(rename = "paused")]
    TurnPaused,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewGame => "new_game",
            Self::TurnOngoing => "player_turn",
            Self::TurnPaused => "paused",
        }
    }

    /// Check if the clock is running for the current player.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::TurnOngoing)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the current turn stands, with the data each phase needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    NewGame,

    /// `started_at` marks the current sub-turn; `accumulated` holds the
    /// earlier sub-turns of the same turn.
    Ongoing {
        player: PlayerColor,
        started_at: DateTime<Utc>,
        accumulated: Duration,
    },

    Paused {
        player: PlayerColor,
        accumulated: Duration,
    },
}

impl TurnPhase {
    pub fn status(&self) -> TurnStatus {
        match self {
            Self::NewGame => TurnStatus::NewGame,
            Self::Ongoing { .. } => TurnStatus::TurnOngoing,
            Self::Paused { .. } => TurnStatus::TurnPaused,
        }
    }

    pub fn player(&self) -> Option<&PlayerColor> {
        match self {
            Self::NewGame => None,
            Self::Ongoing { player, .. } | Self::Paused { player, .. } => Some(player),
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Ongoing { started_at, .. } => Some(*started_at),
            _ => None,
        }
    }

    pub fn accumulated(&self) -> Duration {
        match self {
            Self::NewGame => Duration::zero(),
            Self::Ongoing { accumulated, .. } | Self::Paused { accumulated, .. } => *accumulated,
        }
    }
}

/// Errors raised for timer records that break the record invariants.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Malformed timer record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{status} record has no current player")]
    MissingPlayer { status: TurnStatus },

    #[error("new_game record carries current player {0}")]
    UnexpectedPlayer(PlayerColor),

    #[error("player_turn record has no start time")]
    MissingStartTime,

    #[error("{status} record carries a start time")]
    UnexpectedStartTime { status: TurnStatus },

    #[error("new_game record carries accumulated turn time")]
    UnexpectedAccumulatedTime,

    #[error("new_game record carries player totals")]
    UnexpectedTotals,

    #[error("Negative duration in {0}")]
    NegativeDuration(String),

    #[error("Duration in {0} exceeds {max}ms", max = MAX_DURATION_MS)]
    DurationOutOfRange(String),

    #[error("Timestamp out of range: {0}ms")]
    TimestampOutOfRange(i64),
}

/// Longest duration a record may hold (10,000 years). Keeps every sum the
/// engine forms inside `i64` milliseconds.
pub const MAX_DURATION_MS: i64 = 10_000 * 366 * 24 * 60 * 60 * 1000;

static EMPTY: TimerState = TimerState {
    phase: TurnPhase::NewGame,
    totals: BTreeMap::new(),
};

/// One user's timer record.
///
/// Only constructible through [`TimerState::new_game`], [`TimerState::from_parts`]
/// or by decoding a [`StoredTimerState`], all of which enforce the record
/// invariants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerState {
    phase: TurnPhase,
    /// Completed turns only; the current turn lives in `phase`.
    totals: PlayerTotals,
}

impl TimerState {
    /// The canonical empty record.
    pub fn new_game() -> Self {
        Self::default()
    }

    /// Resolve a possibly-absent record. Absence reads as a new game.
    pub fn or_new(state: Option<&TimerState>) -> &TimerState {
        state.unwrap_or(&EMPTY)
    }

    /// Build a record, checking the invariants the phase type cannot express.
    pub fn from_parts(phase: TurnPhase, totals: PlayerTotals) -> Result<Self, StateError> {
        match &phase {
            TurnPhase::NewGame if !totals.is_empty() => return Err(StateError::UnexpectedTotals),
            TurnPhase::Ongoing { started_at, .. } if started_at.timestamp_millis() <= 0 => {
                return Err(StateError::MissingStartTime)
            }
            _ => {}
        }

        check_duration(phase.accumulated(), "currentTurnAccumulatedTime")?;
        for (color, d) in &totals {
            check_duration(*d, &format!("playerTotals.{}", color))?;
        }

        Ok(Self { phase, totals })
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn status(&self) -> TurnStatus {
        self.phase.status()
    }

    pub fn is_new_game(&self) -> bool {
        matches!(self.phase, TurnPhase::NewGame)
    }

    pub fn current_player(&self) -> Option<&PlayerColor> {
        self.phase.player()
    }

    /// Start of the running sub-turn; `None` unless a turn is ongoing.
    pub fn current_turn_start_time(&self) -> Option<DateTime<Utc>> {
        self.phase.started_at()
    }

    pub fn current_turn_accumulated_time(&self) -> Duration {
        self.phase.accumulated()
    }

    pub fn player_totals(&self) -> &PlayerTotals {
        &self.totals
    }

    /// Persisted document as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, StateError> {
        Ok(serde_json::to_value(StoredTimerState::from(self))?)
    }

    /// Decode and validate a persisted document.
    pub fn from_json(value: serde_json::Value) -> Result<Self, StateError> {
        let stored: StoredTimerState = serde_json::from_value(value)?;
        stored.try_into()
    }
}

/// Flat persisted form of a [`TimerState`].
///
/// Times are epoch milliseconds and durations are milliseconds. An unset start
/// time is stored as `0`. A document without a `status` reads as a new game.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTimerState {
    #[serde(default)]
    pub status: TurnStatus,
    #[serde(default)]
    pub current_player: Option<PlayerColor>,
    #[serde(default)]
    pub current_turn_start_time: i64,
    #[serde(default)]
    pub current_turn_accumulated_time: i64,
    #[serde(default)]
    pub player_totals: BTreeMap<PlayerColor, i64>,
}

impl From<&TimerState> for StoredTimerState {
    fn from(state: &TimerState) -> Self {
        Self {
            status: state.status(),
            current_player: state.current_player().cloned(),
            current_turn_start_time: state
                .current_turn_start_time()
                .map_or(0, |t| t.timestamp_millis()),
            current_turn_accumulated_time: state.current_turn_accumulated_time().num_milliseconds(),
            player_totals: state
                .player_totals()
                .iter()
                .map(|(color, d)| (color.clone(), d.num_milliseconds()))
                .collect(),
        }
    }
}

impl TryFrom<StoredTimerState> for TimerState {
    type Error = StateError;

    fn try_from(stored: StoredTimerState) -> Result<Self, Self::Error> {
        let status = stored.status;
        let accumulated = millis(
            stored.current_turn_accumulated_time,
            "currentTurnAccumulatedTime",
        )?;

        let phase = match status {
            TurnStatus::NewGame => {
                if let Some(player) = stored.current_player {
                    return Err(StateError::UnexpectedPlayer(player));
                }
                if stored.current_turn_start_time != 0 {
                    return Err(StateError::UnexpectedStartTime { status });
                }
                if !accumulated.is_zero() {
                    return Err(StateError::UnexpectedAccumulatedTime);
                }
                TurnPhase::NewGame
            }
            TurnStatus::TurnOngoing => {
                let player = stored
                    .current_player
                    .ok_or(StateError::MissingPlayer { status })?;
                let start = stored.current_turn_start_time;
                if start <= 0 {
                    return Err(StateError::MissingStartTime);
                }
                let started_at = DateTime::from_timestamp_millis(start)
                    .ok_or(StateError::TimestampOutOfRange(start))?;
                TurnPhase::Ongoing {
                    player,
                    started_at,
                    accumulated,
                }
            }
            TurnStatus::TurnPaused => {
                let player = stored
                    .current_player
                    .ok_or(StateError::MissingPlayer { status })?;
                if stored.current_turn_start_time != 0 {
                    return Err(StateError::UnexpectedStartTime { status });
                }
                TurnPhase::Paused {
                    player,
                    accumulated,
                }
            }
        };

        let totals = stored
            .player_totals
            .into_iter()
            .map(|(color, ms)| {
                let d = millis(ms, &format!("playerTotals.{}", color))?;
                Ok((color, d))
            })
            .collect::<Result<PlayerTotals, StateError>>()?;

        TimerState::from_parts(phase, totals)
    }
}

fn check_millis(ms: i64, field: &str) -> Result<(), StateError> {
    if ms < 0 {
        return Err(StateError::NegativeDuration(field.to_string()));
    }
    if ms > MAX_DURATION_MS {
        return Err(StateError::DurationOutOfRange(field.to_string()));
    }
    Ok(())
}

fn check_duration(d: Duration, field: &str) -> Result<(), StateError> {
    check_millis(d.num_milliseconds(), field)
}

fn millis(ms: i64, field: &str) -> Result<Duration, StateError> {
    check_millis(ms, field)?;
    Ok(Duration::milliseconds(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn paused_red() -> TimerState {
        let mut totals = PlayerTotals::new();
        totals.insert("green".into(), Duration::milliseconds(135_000));
        TimerState::from_parts(
            TurnPhase::Paused {
                player: "red".into(),
                accumulated: Duration::milliseconds(35_000),
            },
            totals,
        )
        .unwrap()
    }

    #[test]
    fn test_absent_record_is_new_game() {
        let state = TimerState::or_new(None);
        assert!(state.is_new_game());
        assert_eq!(state.status(), TurnStatus::NewGame);
        assert_eq!(state.current_player(), None);
        assert_eq!(state.current_turn_start_time(), None);
        assert!(state.current_turn_accumulated_time().is_zero());
        assert!(state.player_totals().is_empty());
        assert_eq!(*state, TimerState::new_game());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(TurnStatus::NewGame.as_str(), "new_game");
        assert_eq!(TurnStatus::TurnOngoing.as_str(), "player_turn");
        assert_eq!(TurnStatus::TurnPaused.as_str(), "paused");
        assert!(TurnStatus::TurnOngoing.is_running());
        assert!(!TurnStatus::TurnPaused.is_running());
    }

    #[test]
    fn test_from_parts_rejects_totals_on_new_game() {
        let mut totals = PlayerTotals::new();
        totals.insert("red".into(), Duration::seconds(5));

        let result = TimerState::from_parts(TurnPhase::NewGame, totals);
        assert!(matches!(result, Err(StateError::UnexpectedTotals)));
    }

    #[test]
    fn test_from_parts_rejects_epoch_start() {
        let result = TimerState::from_parts(
            TurnPhase::Ongoing {
                player: "red".into(),
                started_at: at(0),
                accumulated: Duration::zero(),
            },
            PlayerTotals::new(),
        );
        assert!(matches!(result, Err(StateError::MissingStartTime)));
    }

    #[test]
    fn test_from_parts_rejects_negative_durations() {
        let result = TimerState::from_parts(
            TurnPhase::Paused {
                player: "red".into(),
                accumulated: Duration::milliseconds(-1),
            },
            PlayerTotals::new(),
        );
        assert!(matches!(result, Err(StateError::NegativeDuration(_))));
    }

    #[test]
    fn test_to_json_layout() {
        let json = paused_red().to_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "paused",
                "currentPlayer": "red",
                "currentTurnStartTime": 0,
                "currentTurnAccumulatedTime": 35000,
                "playerTotals": { "green": 135000 }
            })
        );
    }

    #[test]
    fn test_json_round_trip() {
        let ongoing = TimerState::from_parts(
            TurnPhase::Ongoing {
                player: "blue".into(),
                started_at: at(1_700_000_000_000),
                accumulated: Duration::milliseconds(1_500),
            },
            paused_red().player_totals().clone(),
        )
        .unwrap();

        for state in [TimerState::new_game(), paused_red(), ongoing] {
            let decoded = TimerState::from_json(state.to_json().unwrap()).unwrap();
            assert_eq!(decoded, state);
        }
    }

    #[test]
    fn test_missing_status_reads_as_new_game() {
        let state = TimerState::from_json(serde_json::json!({})).unwrap();
        assert!(state.is_new_game());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = TimerState::from_json(serde_json::json!({
            "status": "finished",
            "currentPlayer": "red"
        }));
        assert!(matches!(result, Err(StateError::Malformed(_))));
    }

    #[test]
    fn test_inconsistent_documents_rejected() {
        let ongoing_without_player = serde_json::json!({
            "status": "player_turn",
            "currentTurnStartTime": 1000
        });
        assert!(matches!(
            TimerState::from_json(ongoing_without_player),
            Err(StateError::MissingPlayer {
                status: TurnStatus::TurnOngoing
            })
        ));

        let ongoing_without_start = serde_json::json!({
            "status": "player_turn",
            "currentPlayer": "red"
        });
        assert!(matches!(
            TimerState::from_json(ongoing_without_start),
            Err(StateError::MissingStartTime)
        ));

        let paused_with_start = serde_json::json!({
            "status": "paused",
            "currentPlayer": "red",
            "currentTurnStartTime": 1000
        });
        assert!(matches!(
            TimerState::from_json(paused_with_start),
            Err(StateError::UnexpectedStartTime {
                status: TurnStatus::TurnPaused
            })
        ));

        let new_game_with_player = serde_json::json!({
            "status": "new_game",
            "currentPlayer": "red"
        });
        assert!(matches!(
            TimerState::from_json(new_game_with_player),
            Err(StateError::UnexpectedPlayer(_))
        ));

        let negative_total = serde_json::json!({
            "status": "paused",
            "currentPlayer": "red",
            "playerTotals": { "green": -5 }
        });
        assert!(matches!(
            TimerState::from_json(negative_total),
            Err(StateError::NegativeDuration(_))
        ));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let huge_accumulated = serde_json::json!({
            "status": "player_turn",
            "currentPlayer": "red",
            "currentTurnStartTime": 1000,
            "currentTurnAccumulatedTime": i64::MAX
        });
        assert!(matches!(
            TimerState::from_json(huge_accumulated),
            Err(StateError::DurationOutOfRange(field)) if field == "currentTurnAccumulatedTime"
        ));

        let huge_total = serde_json::json!({
            "status": "paused",
            "currentPlayer": "red",
            "currentTurnAccumulatedTime": 1,
            "playerTotals": { "red": i64::MAX }
        });
        assert!(matches!(
            TimerState::from_json(huge_total),
            Err(StateError::DurationOutOfRange(field)) if field == "playerTotals.red"
        ));

        let at_limit = serde_json::json!({
            "status": "paused",
            "currentPlayer": "red",
            "playerTotals": { "red": MAX_DURATION_MS }
        });
        assert!(TimerState::from_json(at_limit).is_ok());

        let result = TimerState::from_parts(
            TurnPhase::Paused {
                player: "red".into(),
                accumulated: Duration::milliseconds(MAX_DURATION_MS + 1),
            },
            PlayerTotals::new(),
        );
        assert!(matches!(result, Err(StateError::DurationOutOfRange(_))));
    }

    #[test]
    fn test_error_display() {
        let err = StateError::MissingPlayer {
            status: TurnStatus::TurnPaused,
        };
        assert_eq!(err.to_string(), "paused record has no current player");
    }
}
