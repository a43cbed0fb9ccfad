//! Turn timer state module.
//!
//! This module provides the timer record and everything that operates on it:
//!
//! - `record` - The per-user timer record and its persisted form
//! - `engine` - Pure turn transitions and time queries
//! - `store` - State store and clock collaborators
//! - `timer` - Read-modify-write game timer over a store and a clock
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          GameTimer<S, C>                             │
//! │                                                                      │
//! │  ┌─────────────────┐   read / write   ┌──────────────────────────┐   │
//! │  │   StateStore    │◀────────────────▶│  user_id → TimerState    │   │
//! │  └─────────────────┘                  └──────────────────────────┘   │
//! │  ┌─────────────────┐                                                 │
//! │  │      Clock      │──── now ───┐                                    │
//! │  └─────────────────┘            ▼                                    │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                      engine (pure)                             │  │
//! │  │                                                                │  │
//! │  │  (Option<&TimerState>, args, now) ──▶ Unchanged | Updated(..)  │  │
//! │  │  (Option<&TimerState>, now)       ──▶ Option<Duration/Totals>  │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use game_timer_state::state::{engine, PlayerColor};
//!
//! let red = PlayerColor::new("red");
//! let state = engine::start_turn(None, &red, now)?.into_updated();
//! let elapsed = engine::current_turn_elapsed(state.as_ref(), later);
//! ```

pub mod engine;
pub mod record;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use engine::{StateDescription, Transition};
pub use record::{
    PlayerColor, PlayerTotals, StateError, StoredTimerState, TimerState, TurnPhase, TurnStatus,
};
pub use store::{Clock, ManualClock, MemoryStore, StateStore, StoreError, SystemClock};
pub use timer::{GameTimer, TimerError};
