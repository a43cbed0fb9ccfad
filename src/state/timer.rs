//! Per-user game timer.
//!
//! Runs the engine against a [`StateStore`] and a [`Clock`]: read the user's
//! record, apply the operation at the current time, and write back only when
//! the record changed.

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::engine::{self, StateDescription, Transition};
use super::record::{PlayerColor, PlayerTotals, StateError, TimerState};
use super::store::{Clock, StateStore, StoreError, SystemClock};
use crate::config::TimerConfig;
use crate::format::TurnReport;

/// Game timer errors.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("No player color given")]
    MissingColor,

    #[error("Unknown player color: {0}")]
    UnknownColor(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for game timer operations.
pub type Result<T> = std::result::Result<T, TimerError>;

/// Game timer for any number of users sharing one store.
#[derive(Debug)]
pub struct GameTimer<S, C = SystemClock> {
    store: S,
    clock: C,
    config: TimerConfig,
}

impl<S: StateStore> GameTimer<S, SystemClock> {
    /// Game timer on the wall clock with the default palette.
    pub fn with_store(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S: StateStore, C: Clock> GameTimer<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self::with_config(store, clock, TimerConfig::default())
    }

    pub fn with_config(store: S, clock: C, config: TimerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Trim and lowercase a raw color token, then check it against the palette.
    pub fn parse_color(&self, raw: &str) -> Result<PlayerColor> {
        let token = TimerConfig::fold_color(raw);
        if token.is_empty() {
            return Err(TimerError::MissingColor);
        }

        let color = PlayerColor::new(token);
        if !self.config.accepts(&color) {
            return Err(TimerError::UnknownColor(color.to_string()));
        }
        Ok(color)
    }

    fn commit(&mut self, user_id: &str, transition: Transition) -> Result<Transition> {
        match &transition {
            Transition::Updated(state) => {
                self.store.write(user_id, state)?;
                debug!(user_id, status = %state.status(), "Saved timer record");
            }
            Transition::Unchanged => debug!(user_id, "Timer record unchanged"),
        }
        Ok(transition)
    }

    /// Reset the user's game. Always writes.
    pub fn new_game(&mut self, user_id: &str) -> Result<TimerState> {
        let state = engine::new_game();
        self.store.write(user_id, &state)?;
        info!(user_id, "Started new game");
        Ok(state)
    }

    pub fn start_turn(&mut self, user_id: &str, color: &str) -> Result<Transition> {
        let color = self.parse_color(color)?;
        let prev = self.store.read(user_id)?;
        let transition = engine::start_turn(prev.as_ref(), &color, self.clock.now())?;
        self.commit(user_id, transition)
    }

    pub fn pause_turn(&mut self, user_id: &str) -> Result<Transition> {
        let prev = self.store.read(user_id)?;
        let transition = engine::pause_turn(prev.as_ref(), self.clock.now())?;
        self.commit(user_id, transition)
    }

    pub fn continue_turn(&mut self, user_id: &str) -> Result<Transition> {
        let prev = self.store.read(user_id)?;
        let transition = engine::continue_turn(prev.as_ref(), self.clock.now())?;
        self.commit(user_id, transition)
    }

    pub fn describe(&self, user_id: &str) -> Result<StateDescription> {
        let state = self.store.read(user_id)?;
        Ok(engine::describe_state(state.as_ref()))
    }

    pub fn current_turn_elapsed(&self, user_id: &str) -> Result<Option<Duration>> {
        let state = self.store.read(user_id)?;
        Ok(engine::current_turn_elapsed(state.as_ref(), self.clock.now()))
    }

    /// Total time for a color. The color is normalized but not checked
    /// against the palette.
    pub fn player_total_time(&self, user_id: &str, color: &str) -> Result<Option<Duration>> {
        let token = TimerConfig::fold_color(color);
        if token.is_empty() {
            return Err(TimerError::MissingColor);
        }

        let state = self.store.read(user_id)?;
        Ok(engine::player_total_time(
            state.as_ref(),
            &PlayerColor::new(token),
            self.clock.now(),
        ))
    }

    pub fn all_players_total_time(&self, user_id: &str) -> Result<Option<PlayerTotals>> {
        let state = self.store.read(user_id)?;
        Ok(engine::all_players_total_time(state.as_ref(), self.clock.now()))
    }

    /// Every query result for the user at the current time.
    pub fn report(&self, user_id: &str) -> Result<TurnReport> {
        let state = self.store.read(user_id)?;
        Ok(TurnReport::new(state.as_ref(), self.clock.now()))
    }
}
