//! Human-readable durations and JSON reports for the response layer.

use chrono::{DateTime, Duration, Utc};

use crate::state::engine::{self, StateDescription};
use crate::state::{PlayerTotals, TimerState};

fn unit(count: i64, singular: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

/// Join items the way they are spoken: "a", "a and b", "a, b and c".
pub fn spoken_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Render a duration as words, e.g. "1 hour, 2 minutes and 5 seconds".
///
/// Sub-second remainders are dropped; negative durations read as zero.
pub fn human_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(unit(seconds, "second"));
    }
    spoken_list(&parts)
}

/// Sum of every player's time.
pub fn total_time(totals: &PlayerTotals) -> Duration {
    totals.values().fold(Duration::zero(), |acc, d| acc + *d)
}

/// Snapshot of every query result for one record at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub description: StateDescription,
    pub current_turn: Option<Duration>,
    pub totals: Option<PlayerTotals>,
}

impl TurnReport {
    pub fn new(state: Option<&TimerState>, now: DateTime<Utc>) -> Self {
        Self {
            description: engine::describe_state(state),
            current_turn: engine::current_turn_elapsed(state, now),
            totals: engine::all_players_total_time(state, now),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let current_turn = self.current_turn.map(|d| {
            serde_json::json!({
                "ms": d.num_milliseconds(),
                "spoken": human_duration(d),
            })
        });

        let totals = self.totals.as_ref().map(|totals| {
            let players: Vec<serde_json::Value> = totals
                .iter()
                .map(|(color, d)| {
                    serde_json::json!({
                        "color": color.as_str(),
                        "ms": d.num_milliseconds(),
                        "spoken": human_duration(*d),
                    })
                })
                .collect();
            let all = total_time(totals);
            serde_json::json!({
                "ms": all.num_milliseconds(),
                "spoken": human_duration(all),
                "players": players,
            })
        });

        serde_json::json!({
            "status": self.description.status.as_str(),
            "current_player": self.description.current_player.as_ref().map(|c| c.as_str()),
            "current_turn": current_turn,
            "totals": totals,
        })
    }
}
