use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Where a click-bound command is sent.
///
/// - `Spawn` (`-1`): start a new detached process for every click.
/// - `Stdin` (`0`): write the command line to the stdin of the executor's own
///   running (continuous) command.
/// - `Shared(n)` (`n >= 1`): an externally configured shared sink. Accepted by
///   the config so files stay forward compatible, but rejected when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i32")]
pub enum Sink {
    Spawn,
    Stdin,
    Shared(u16),
}

impl Default for Sink {
    fn default() -> Self {
        Sink::Spawn
    }
}

impl TryFrom<i32> for Sink {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Sink::Spawn),
            0 => Ok(Sink::Stdin),
            n if n >= 1 && n <= u16::MAX as i32 => Ok(Sink::Shared(n as u16)),
            other => Err(format!(
                "invalid command sink {other} (expected -1, 0, or a positive sink id)"
            )),
        }
    }
}

impl Sink {
    /// Numeric id as written in the config file.
    pub fn id(self) -> i32 {
        match self {
            Sink::Spawn => -1,
            Sink::Stdin => 0,
            Sink::Shared(n) => n as i32,
        }
    }
}

/// Pointer buttons, numbered like X11 core buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

impl MouseButton {
    pub fn number(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::WheelUp => 4,
            MouseButton::WheelDown => 5,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MouseButton::Left),
            2 => Ok(MouseButton::Middle),
            3 => Ok(MouseButton::Right),
            4 => Ok(MouseButton::WheelUp),
            5 => Ok(MouseButton::WheelDown),
            other => Err(format!("invalid mouse button {other} (expected 1-5)")),
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "middle" => Ok(MouseButton::Middle),
            "right" => Ok(MouseButton::Right),
            "wheel_up" | "up" => Ok(MouseButton::WheelUp),
            "wheel_down" | "down" => Ok(MouseButton::WheelDown),
            other => other
                .parse::<u8>()
                .map_err(|_| format!("invalid mouse button: {other}"))
                .and_then(MouseButton::try_from),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
            MouseButton::WheelUp => "wheel_up",
            MouseButton::WheelDown => "wheel_down",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_ids_round_trip_through_config_values() {
        assert_eq!(Sink::try_from(-1), Ok(Sink::Spawn));
        assert_eq!(Sink::try_from(0), Ok(Sink::Stdin));
        assert_eq!(Sink::try_from(3), Ok(Sink::Shared(3)));
        assert!(Sink::try_from(-2).is_err());
        assert_eq!(Sink::Shared(3).id(), 3);
    }

    #[test]
    fn buttons_parse_from_names_and_numbers() {
        assert_eq!("left".parse::<MouseButton>(), Ok(MouseButton::Left));
        assert_eq!("5".parse::<MouseButton>(), Ok(MouseButton::WheelDown));
        assert!("6".parse::<MouseButton>().is_err());
        assert_eq!(MouseButton::Right.number(), 3);
    }
}
