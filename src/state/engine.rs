//! Turn-timer engine.
//!
//! Pure operations over a [`TimerState`]. Every operation takes the previous
//! record (absent means a new game) plus the current time, and either reports
//! that nothing changed or hands back a complete replacement record. Nothing
//! here reads a clock or touches storage.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::record::{PlayerColor, PlayerTotals, StateError, TimerState, TurnPhase, TurnStatus};

/// Outcome of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to write
    Unchanged,
    /// Replacement record to write back
    Updated(TimerState),
}

impl Transition {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn updated(&self) -> Option<&TimerState> {
        match self {
            Self::Updated(state) => Some(state),
            Self::Unchanged => None,
        }
    }

    pub fn into_updated(self) -> Option<TimerState> {
        match self {
            Self::Updated(state) => Some(state),
            Self::Unchanged => None,
        }
    }
}

/// Status and current player of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDescription {
    pub status: TurnStatus,
    pub current_player: Option<PlayerColor>,
}

impl StateDescription {
    pub fn is_new_game(&self) -> bool {
        self.status == TurnStatus::NewGame
    }

    /// A turn exists, running or paused.
    pub fn has_game_in_progress(&self) -> bool {
        !self.is_new_game()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status.as_str(),
            "current_player": self.current_player.as_ref().map(PlayerColor::as_str),
        })
    }
}

/// Time between a sub-turn start and `now`, never negative.
fn elapsed_since(started_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let elapsed = now - started_at;
    if elapsed < Duration::zero() {
        warn!(
            started_at = %started_at,
            now = %now,
            "Clock is behind the turn start; counting no elapsed time"
        );
        return Duration::zero();
    }
    elapsed
}

fn updated(phase: TurnPhase, totals: PlayerTotals) -> Result<Transition, StateError> {
    TimerState::from_parts(phase, totals).map(Transition::Updated)
}

/// Reset to the empty record, discarding every turn.
pub fn new_game() -> TimerState {
    debug!("New game");
    TimerState::new_game()
}

/// Start `color`'s turn, or resume it if it is the paused current turn.
///
/// Switching players closes the previous turn and merges it into the totals.
pub fn start_turn(
    prev: Option<&TimerState>,
    color: &PlayerColor,
    now: DateTime<Utc>,
) -> Result<Transition, StateError> {
    let prev = TimerState::or_new(prev);

    match prev.phase() {
        TurnPhase::NewGame => {
            debug!(player = %color, "First turn of the game");
            updated(
                TurnPhase::Ongoing {
                    player: color.clone(),
                    started_at: now,
                    accumulated: Duration::zero(),
                },
                PlayerTotals::new(),
            )
        }
        TurnPhase::Ongoing { player, .. } if player == color => {
            debug!(player = %color, "Turn already running");
            Ok(Transition::Unchanged)
        }
        TurnPhase::Paused {
            player,
            accumulated,
        } if player == color => {
            debug!(player = %color, "Resuming paused turn");
            updated(
                TurnPhase::Ongoing {
                    player: player.clone(),
                    started_at: now,
                    accumulated: *accumulated,
                },
                prev.player_totals().clone(),
            )
        }
        TurnPhase::Ongoing {
            player,
            started_at,
            accumulated,
        } => {
            let closed = elapsed_since(*started_at, now) + *accumulated;
            switch_player(prev, player, closed, color, now)
        }
        TurnPhase::Paused {
            player,
            accumulated,
        } => switch_player(prev, player, *accumulated, color, now),
    }
}

fn switch_player(
    prev: &TimerState,
    previous: &PlayerColor,
    closed: Duration,
    next: &PlayerColor,
    now: DateTime<Utc>,
) -> Result<Transition, StateError> {
    let mut totals = prev.player_totals().clone();
    let total = totals.entry(previous.clone()).or_insert_with(Duration::zero);
    *total = *total + closed;

    debug!(
        previous = %previous,
        next = %next,
        closed_ms = closed.num_milliseconds(),
        "Closed turn"
    );

    updated(
        TurnPhase::Ongoing {
            player: next.clone(),
            started_at: now,
            accumulated: Duration::zero(),
        },
        totals,
    )
}

/// Pause the running turn. No-op unless a turn is ongoing.
pub fn pause_turn(prev: Option<&TimerState>, now: DateTime<Utc>) -> Result<Transition, StateError> {
    let prev = TimerState::or_new(prev);

    match prev.phase() {
        TurnPhase::NewGame | TurnPhase::Paused { .. } => Ok(Transition::Unchanged),
        TurnPhase::Ongoing {
            player,
            started_at,
            accumulated,
        } => {
            debug!(player = %player, "Pausing turn");
            updated(
                TurnPhase::Paused {
                    player: player.clone(),
                    accumulated: *accumulated + elapsed_since(*started_at, now),
                },
                prev.player_totals().clone(),
            )
        }
    }
}

/// Resume the paused turn of the current player. No-op unless paused.
pub fn continue_turn(
    prev: Option<&TimerState>,
    now: DateTime<Utc>,
) -> Result<Transition, StateError> {
    let prev = TimerState::or_new(prev);

    match prev.phase() {
        TurnPhase::Paused {
            player,
            accumulated,
        } => {
            debug!(player = %player, "Continuing turn");
            updated(
                TurnPhase::Ongoing {
                    player: player.clone(),
                    started_at: now,
                    accumulated: *accumulated,
                },
                prev.player_totals().clone(),
            )
        }
        TurnPhase::NewGame | TurnPhase::Ongoing { .. } => Ok(Transition::Unchanged),
    }
}

pub fn describe_state(prev: Option<&TimerState>) -> StateDescription {
    let prev = TimerState::or_new(prev);
    StateDescription {
        status: prev.status(),
        current_player: prev.current_player().cloned(),
    }
}

/// Time spent in the current turn so far, across its sub-turns.
///
/// `None` on a new game.
pub fn current_turn_elapsed(prev: Option<&TimerState>, now: DateTime<Utc>) -> Option<Duration> {
    match TimerState::or_new(prev).phase() {
        TurnPhase::NewGame => None,
        TurnPhase::Ongoing {
            started_at,
            accumulated,
            ..
        } => Some(*accumulated + elapsed_since(*started_at, now)),
        TurnPhase::Paused { accumulated, .. } => Some(*accumulated),
    }
}

/// The current player and what their open turn has accrued.
fn accruing(state: &TimerState, now: DateTime<Utc>) -> Option<(&PlayerColor, Duration)> {
    let player = state.current_player()?;
    current_turn_elapsed(Some(state), now).map(|elapsed| (player, elapsed))
}

/// A player's time over all turns, including the open one.
///
/// `None` on a new game.
pub fn player_total_time(
    prev: Option<&TimerState>,
    color: &PlayerColor,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let prev = TimerState::or_new(prev);
    if prev.is_new_game() {
        return None;
    }

    let completed = prev
        .player_totals()
        .get(color)
        .copied()
        .unwrap_or_else(Duration::zero);

    match accruing(prev, now) {
        Some((player, open)) if player == color => Some(completed + open),
        _ => Some(completed),
    }
}

/// Every player's time over all turns, including the open one.
///
/// `None` on a new game.
pub fn all_players_total_time(
    prev: Option<&TimerState>,
    now: DateTime<Utc>,
) -> Option<PlayerTotals> {
    let prev = TimerState::or_new(prev);
    if prev.is_new_game() {
        return None;
    }

    let mut totals = prev.player_totals().clone();
    if let Some((player, open)) = accruing(prev, now) {
        let total = totals.entry(player.clone()).or_insert_with(Duration::zero);
        *total = *total + open;
    }
    Some(totals)
}
