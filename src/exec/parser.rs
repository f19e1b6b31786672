// src/exec/parser.rs

//! Turning raw command output into something a panel can show.
//!
//! All functions here are pure: they take bytes (or a buffer) and hand back
//! text, an optional icon path and an optional tooltip.

use std::path::PathBuf;

use super::buffer::OutputBuffer;

/// ANSI "erase display". Everything up to its last occurrence on stderr is
/// considered stale.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";

/// Upper bound for tooltips taken from stderr.
pub const MAX_TOOLTIP_BYTES: usize = 4096;

/// What one interpreted chunk of stdout shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    pub text: String,
    pub icon: Option<PathBuf>,
    pub markup: bool,
}

impl Content {
    /// Nothing to show: the surface should be hidden rather than drawn empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.icon.is_none()
    }
}

/// Interpret the whole stdout of a finished one-shot run.
pub fn interpret_oneshot(stdout: &[u8], has_icon: bool) -> Content {
    split_chunk(&String::from_utf8_lossy(stdout), has_icon)
}

/// Consume every complete `lines`-line chunk at the front of `buf` and return
/// the content of the last one, or `None` if no chunk is complete yet.
///
/// A trailing partial line stays in the buffer for the next read.
pub fn take_continuous_chunks(
    buf: &mut OutputBuffer,
    lines: usize,
    has_icon: bool,
) -> Option<Content> {
    if lines == 0 {
        return None;
    }

    let mut latest = None;
    while let Some(end) = chunk_end(buf.as_bytes(), lines) {
        latest = Some(split_chunk(
            &String::from_utf8_lossy(&buf.as_bytes()[..end]),
            has_icon,
        ));
        buf.consume_front(end);
    }
    latest
}

/// Byte offset just past the `lines`-th newline, if there are that many.
fn chunk_end(bytes: &[u8], lines: usize) -> Option<usize> {
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(lines - 1)
        .map(|(i, _)| i + 1)
}

fn split_chunk(chunk: &str, has_icon: bool) -> Content {
    let (icon, rest) = if has_icon {
        match chunk.split_once('\n') {
            Some((first, rest)) => (first, rest),
            None => (chunk, ""),
        }
    } else {
        ("", chunk)
    };

    let text = rest.strip_suffix('\n').unwrap_or(rest);
    let icon = icon.trim();

    Content {
        text: text.to_string(),
        icon: (!icon.is_empty()).then(|| expand_tilde(icon)),
        markup: false,
    }
}

/// Tooltip derived from stderr: whatever follows the last clear-screen
/// sequence, with trailing whitespace trimmed and capped in size.
pub fn extract_tooltip(stderr: &[u8]) -> Option<String> {
    let start = stderr
        .windows(CLEAR_SCREEN.len())
        .rposition(|w| w == CLEAR_SCREEN)
        .map_or(0, |i| i + CLEAR_SCREEN.len());

    let tail = String::from_utf8_lossy(&stderr[start..]);
    let mut tooltip = tail.trim_end().to_string();
    if tooltip.len() > MAX_TOOLTIP_BYTES {
        let mut cut = MAX_TOOLTIP_BYTES;
        while !tooltip.is_char_boundary(cut) {
            cut -= 1;
        }
        tooltip.truncate(cut);
    }

    (!tooltip.is_empty()).then_some(tooltip)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    }
}
