//! Animation modes, shroud zones and the illumination command table.
//!
//! The command codes and timing values are protocol constants understood by
//! the vendor firmware; they are not tunable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Illumination behavior selected by the user.
///
/// Persisted as its integer index; names are accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "AnimationRepr", into = "u8")]
pub enum AnimationMode {
    #[default]
    NoAnimation,
    Breathing,
    Flashing,
    DoubleFlashing,
    Off,
    TemperatureBased,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 6] = [
        AnimationMode::NoAnimation,
        AnimationMode::Breathing,
        AnimationMode::Flashing,
        AnimationMode::DoubleFlashing,
        AnimationMode::Off,
        AnimationMode::TemperatureBased,
    ];

    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Whether the firmware should run the animation from a single call.
    pub const fn single_call(self) -> bool {
        !matches!(self, AnimationMode::NoAnimation)
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnimationMode::NoAnimation => "NoAnimation",
            AnimationMode::Breathing => "Breathing",
            AnimationMode::Flashing => "Flashing",
            AnimationMode::DoubleFlashing => "DoubleFlashing",
            AnimationMode::Off => "Off",
            AnimationMode::TemperatureBased => "TemperatureBased",
        };
        f.write_str(name)
    }
}

impl From<AnimationMode> for u8 {
    fn from(mode: AnimationMode) -> Self {
        mode.index()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnimationRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<AnimationRepr> for AnimationMode {
    type Error = String;

    fn try_from(repr: AnimationRepr) -> Result<Self, Self::Error> {
        match repr {
            AnimationRepr::Index(index) => {
                Self::from_index(index).ok_or_else(|| format!("unknown animation index {index}"))
            }
            AnimationRepr::Name(name) => Self::ALL
                .into_iter()
                .find(|mode| mode.to_string().eq_ignore_ascii_case(&name))
                .ok_or_else(|| format!("unknown animation type '{name}'")),
        }
    }
}

/// Independently controllable LED group on the card shroud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Front,
    Side,
    Back,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Front, Zone::Side, Zone::Back];

    /// Hardware LED group identifier.
    pub const fn led_group(self) -> i32 {
        match self {
            Zone::Front => 4,
            Zone::Side => 1,
            Zone::Back => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Front => "front",
            Zone::Side => "side",
            Zone::Back => "back",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full parameter list of one illumination call, minus the adapter index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IlluminationCommand {
    pub cmd: i32,
    pub led_group: i32,
    pub secondary_led_group: i32,
    pub time: i32,
    pub on_time: i32,
    pub off_time: i32,
    pub dark_time: i32,
    pub brightness: i32,
    pub single_call: bool,
}

impl IlluminationCommand {
    /// Resolves the command a zone sends for the given mode.
    ///
    /// Temperature mode uses the static-color command; the color itself
    /// comes from the latest temperature sample.
    pub const fn for_mode(mode: AnimationMode, zone: Zone) -> Self {
        let (cmd, time, on_time, off_time, dark_time) = match mode {
            AnimationMode::NoAnimation | AnimationMode::TemperatureBased => (21, 4, 0, 0, 0),
            AnimationMode::Breathing => (27, 7, 0, 0, 0),
            AnimationMode::Flashing => (28, 0, 25, 100, 0),
            AnimationMode::DoubleFlashing => (30, 0, 10, 10, 91),
            AnimationMode::Off => (24, 4, 0, 0, 0),
        };

        Self {
            cmd,
            led_group: zone.led_group(),
            secondary_led_group: 0,
            time,
            on_time,
            off_time,
            dark_time,
            brightness: 0,
            single_call: mode.single_call(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(mode: AnimationMode, zone: Zone) -> (i32, i32, i32, i32, i32, i32) {
        let c = IlluminationCommand::for_mode(mode, zone);
        (c.cmd, c.led_group, c.time, c.on_time, c.off_time, c.dark_time)
    }

    #[test]
    fn command_table() {
        assert_eq!(params(AnimationMode::NoAnimation, Zone::Front), (21, 4, 4, 0, 0, 0));
        assert_eq!(params(AnimationMode::Breathing, Zone::Side), (27, 1, 7, 0, 0, 0));
        assert_eq!(params(AnimationMode::Flashing, Zone::Back), (28, 2, 0, 25, 100, 0));
        assert_eq!(params(AnimationMode::DoubleFlashing, Zone::Front), (30, 4, 0, 10, 10, 91));
        assert_eq!(params(AnimationMode::Off, Zone::Side), (24, 1, 4, 0, 0, 0));
        assert_eq!(params(AnimationMode::TemperatureBased, Zone::Back), (21, 2, 4, 0, 0, 0));
    }

    #[test]
    fn single_call_flag_only_off_for_static_color() {
        for mode in AnimationMode::ALL {
            let command = IlluminationCommand::for_mode(mode, Zone::Front);
            assert_eq!(command.single_call, mode != AnimationMode::NoAnimation);
            assert_eq!(command.brightness, 0);
            assert_eq!(command.secondary_led_group, 0);
        }
    }

    #[test]
    fn zone_led_groups() {
        assert_eq!(Zone::Front.led_group(), 4);
        assert_eq!(Zone::Side.led_group(), 1);
        assert_eq!(Zone::Back.led_group(), 2);
    }

    #[test]
    fn mode_reads_index_and_name() {
        let by_index: AnimationMode = serde_json::from_str("5").unwrap();
        assert_eq!(by_index, AnimationMode::TemperatureBased);

        let by_name: AnimationMode = serde_json::from_str("\"breathing\"").unwrap();
        assert_eq!(by_name, AnimationMode::Breathing);

        assert!(serde_json::from_str::<AnimationMode>("9").is_err());
        assert!(serde_json::from_str::<AnimationMode>("\"Rainbow\"").is_err());
    }

    #[test]
    fn mode_written_as_index() {
        assert_eq!(serde_json::to_string(&AnimationMode::Off).unwrap(), "4");
    }
}
