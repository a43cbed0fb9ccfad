//! Game Timer State Library
//!
//! This crate provides turn timing for board games played with colored
//! players.
//!
//! # Overview
//!
//! - **Timer Record** - One user's game: whose turn it is, whether it is
//!   running or paused, and each player's time from completed turns.
//!
//! - **Engine** - Pure transitions (new game, start, pause, continue) and
//!   queries (current turn time, one player's total, every player's total).
//!
//! - **Game Timer** - Reads a user's record from a store, applies the engine
//!   at the clock's current time, and writes back changed records.
//!
//! # Design Principles
//!
//! 1. **Records are always valid** - Every record is built through one checked
//!    constructor; stored documents that break the invariants are rejected.
//!
//! 2. **Time is an argument** - The engine never reads a clock.
//!
//! 3. **No networking** - Storage engines and request dispatch live elsewhere.
//!
//! # Example
//!
//! ```rust
//! use chrono::{DateTime, Duration};
//! use game_timer_state::state::{GameTimer, ManualClock, MemoryStore, TurnStatus};
//!
//! let clock = ManualClock::new(DateTime::from_timestamp_millis(1_000).unwrap());
//! let mut timer = GameTimer::new(MemoryStore::new(), clock);
//!
//! timer.start_turn("user-1", "red").unwrap();
//! timer.clock().advance(Duration::seconds(5));
//! timer.pause_turn("user-1").unwrap();
//!
//! let desc = timer.describe("user-1").unwrap();
//! assert_eq!(desc.status, TurnStatus::TurnPaused);
//! assert_eq!(
//!     timer.player_total_time("user-1", "red").unwrap(),
//!     Some(Duration::seconds(5))
//! );
//! ```

pub mod config;
pub mod format;
pub mod state;

// Re-export everything from state module at crate root
pub use config::TimerConfig;
pub use state::*;
