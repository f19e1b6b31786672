// src/exec/tooltip.rs

//! Fallback tooltip describing when an executor last ran.

use std::time::Duration;

/// Timestamps the status line is built from, all relative to "now".
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTimes {
    /// Time since the running command started, if one is running.
    pub running_for: Option<Duration>,
    /// Time since the last run finished, if any run finished.
    pub finished_ago: Option<Duration>,
    /// Duration of the last finished run.
    pub last_duration: Option<Duration>,
    /// Time until the next scheduled run.
    pub next_in: Option<Duration>,
}

/// `Ns`, `M:SSs` or `H:MM:SSs`.
pub fn time_to_string(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}s")
    } else if m > 0 {
        format!("{m}:{s:02}s")
    } else {
        format!("{s}s")
    }
}

pub fn status_tooltip(t: &RunTimes) -> String {
    match (t.finished_ago, t.running_for) {
        (None, None) => "Never updated. No update scheduled.".to_string(),
        (None, Some(running)) => format!(
            "First update in progress (started {} ago).",
            time_to_string(running)
        ),
        (Some(ago), Some(running)) => format!(
            "Last update finished {} ago. Update in progress (started {} ago).",
            time_to_string(ago),
            time_to_string(running)
        ),
        (Some(ago), None) => {
            let took = time_to_string(t.last_duration.unwrap_or_default());
            match t.next_in {
                Some(next) => format!(
                    "Last update finished {} ago (took {}). Next update starting in {}.",
                    time_to_string(ago),
                    took,
                    time_to_string(next)
                ),
                None => format!(
                    "Last update finished {} ago (took {}).",
                    time_to_string(ago),
                    took
                ),
            }
        }
    }
}
