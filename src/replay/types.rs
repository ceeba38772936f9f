use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use super::mods::ModFlags;

/// `time_delta` of the frame that carries the RNG seed instead of input.
pub const SEED_FRAME_DELTA: i32 = -12345;

#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
pub enum GameMode {
    #[serde(rename = "osu")]
    Standard = 0,
    #[serde(rename = "taiko")]
    Taiko = 1,
    #[serde(rename = "fruits")]
    Fruits = 2,
    #[serde(rename = "mania")]
    Mania = 3,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Standard,
        GameMode::Taiko,
        GameMode::Fruits,
        GameMode::Mania,
    ];

    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// Ruleset name used by the web API.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Standard => "osu",
            GameMode::Taiko => "taiko",
            GameMode::Fruits => "fruits",
            GameMode::Mania => "mania",
        }
    }
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Standard
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode {0:?}")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownGameMode(s.to_string()))
    }
}

bitflags::bitflags! {
    /// Buttons held during a frame. Unknown bits are retained because the
    /// seed frame stores its payload in this field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Keys: u32 {
        const M1 = 1 << 0;
        const M2 = 1 << 1;
        const K1 = 1 << 2;
        const K2 = 1 << 3;
        const SMOKE = 1 << 4;
    }
}

impl Keys {
    pub fn from_wire(raw: i32) -> Self {
        Keys::from_bits_retain(raw as u32)
    }

    pub fn to_wire(self) -> i32 {
        self.bits() as i32
    }
}

impl Default for Keys {
    fn default() -> Self {
        Keys::empty()
    }
}

impl Serialize for Keys {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Keys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Keys::from_bits_retain(bits))
    }
}

/// One life-bar sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifeBarEntry {
    /// Fraction of the bar, `0.0..=1.0`.
    pub health: f64,
    pub time_offset: i32,
}

/// One sampled input tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    /// Milliseconds since the previous frame.
    pub time_delta: i32,
    pub x: f32,
    pub y: f32,
    pub keys: Keys,
}

impl InputFrame {
    pub fn seed(seed: i32) -> Self {
        InputFrame {
            time_delta: SEED_FRAME_DELTA,
            x: 0.0,
            y: 0.0,
            keys: Keys::from_wire(seed),
        }
    }

    pub fn is_seed(&self) -> bool {
        self.time_delta == SEED_FRAME_DELTA
    }

    /// RNG seed carried by a seed frame.
    pub fn seed_value(&self) -> Option<i32> {
        self.is_seed().then(|| self.keys.to_wire())
    }
}

/// A decoded replay. Fields appear in wire order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub mode: GameMode,
    pub version: i32,
    pub beatmap_hash: String,
    pub player_name: String,
    pub replay_hash: String,
    pub count_300: i16,
    pub count_100: i16,
    pub count_50: i16,
    pub count_geki: i16,
    pub count_katu: i16,
    pub count_miss: i16,
    pub total_score: i32,
    pub max_combo: i16,
    pub perfect: bool,
    pub mods: ModFlags,
    pub life_bar: Vec<LifeBarEntry>,
    /// Windows ticks (100ns since 0001-01-01).
    pub timestamp: i64,
    pub frames: Vec<InputFrame>,
    pub score_id: i64,
    /// Present only when `mods` carries `TARGET_PRACTICE`.
    pub target_practice: Option<f64>,
}

impl ReplayRecord {
    pub fn mods_display(&self) -> String {
        self.mods.to_display_string()
    }

    /// Seed carried by the first seed frame, if the recording has one.
    pub fn seed(&self) -> Option<i32> {
        self.frames.iter().find_map(InputFrame::seed_value)
    }

    /// Frames that carry real input.
    pub fn input_frames(&self) -> impl Iterator<Item = &InputFrame> {
        self.frames.iter().filter(|frame| !frame.is_seed())
    }
}
