//! Gameplay modifier bitset.
//!
//! Stored on the wire as a little-endian `int32`. The textual form is a
//! concatenation of two-letter codes in bit order, e.g. `HDDT`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModFlags: u32 {
        const NO_FAIL = 1 << 0;
        const EASY = 1 << 1;
        /// Formerly "NoVideo".
        const TOUCH_DEVICE = 1 << 2;
        const HIDDEN = 1 << 3;
        const HARD_ROCK = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME = 1 << 6;
        const RELAX = 1 << 7;
        const HALF_TIME = 1 << 8;
        /// Always sent together with `DOUBLE_TIME`.
        const NIGHTCORE = 1 << 9;
        const FLASHLIGHT = 1 << 10;
        const AUTOPLAY = 1 << 11;
        const SPUN_OUT = 1 << 12;
        const AUTOPILOT = 1 << 13;
        const PERFECT = 1 << 14;
        const KEY4 = 1 << 15;
        const KEY5 = 1 << 16;
        const KEY6 = 1 << 17;
        const KEY7 = 1 << 18;
        const KEY8 = 1 << 19;
        const FADE_IN = 1 << 20;
        const RANDOM = 1 << 21;
        const CINEMA = 1 << 22;
        /// Adds a trailing `float64` to the replay.
        const TARGET_PRACTICE = 1 << 23;
        const KEY9 = 1 << 24;
        const KEY_COOP = 1 << 25;
        const KEY1 = 1 << 26;
        const KEY3 = 1 << 27;
        const KEY2 = 1 << 28;
        const SCORE_V2 = 1 << 29;
        const MIRROR = 1 << 30;
    }
}

/// Display code of the empty bitset.
pub const NO_MOD_CODE: &str = "NM";

/// Canonical code table, in display order.
const MOD_CODES: [(ModFlags, &str); 31] = [
    (ModFlags::NO_FAIL, "NF"),
    (ModFlags::EASY, "EZ"),
    (ModFlags::TOUCH_DEVICE, "TD"),
    (ModFlags::HIDDEN, "HD"),
    (ModFlags::HARD_ROCK, "HR"),
    (ModFlags::SUDDEN_DEATH, "SD"),
    (ModFlags::DOUBLE_TIME, "DT"),
    (ModFlags::RELAX, "RX"),
    (ModFlags::HALF_TIME, "HT"),
    (ModFlags::NIGHTCORE, "NC"),
    (ModFlags::FLASHLIGHT, "FL"),
    (ModFlags::AUTOPLAY, "AU"),
    (ModFlags::SPUN_OUT, "SO"),
    (ModFlags::AUTOPILOT, "AP"),
    (ModFlags::PERFECT, "PF"),
    (ModFlags::KEY4, "K4"),
    (ModFlags::KEY5, "K5"),
    (ModFlags::KEY6, "K6"),
    (ModFlags::KEY7, "K7"),
    (ModFlags::KEY8, "K8"),
    (ModFlags::FADE_IN, "FI"),
    (ModFlags::RANDOM, "RN"),
    (ModFlags::CINEMA, "CN"),
    (ModFlags::TARGET_PRACTICE, "TP"),
    (ModFlags::KEY9, "K9"),
    (ModFlags::KEY_COOP, "CO"),
    (ModFlags::KEY1, "K1"),
    (ModFlags::KEY3, "K3"),
    (ModFlags::KEY2, "K2"),
    (ModFlags::SCORE_V2, "V2"),
    (ModFlags::MIRROR, "MI"),
];

impl ModFlags {
    /// Reinterprets the wire `int32`, keeping every bit.
    pub fn from_wire(raw: i32) -> Self {
        ModFlags::from_bits_retain(raw as u32)
    }

    pub fn to_wire(self) -> i32 {
        self.bits() as i32
    }

    /// Parses a run of two-letter codes such as `"hddt"`, case-insensitively.
    /// Unknown codes are skipped.
    pub fn from_codes(codes: &str) -> Self {
        let lowered: Vec<char> = codes.to_lowercase().chars().collect();
        lowered
            .chunks(2)
            .filter_map(|chunk| {
                let code: String = chunk.iter().collect();
                Self::from_code(&code)
            })
            .fold(ModFlags::empty(), |acc, flag| acc | flag)
    }

    /// Looks up a single two-letter code. `NM` maps to the empty set.
    pub fn from_code(code: &str) -> Option<Self> {
        if code.eq_ignore_ascii_case(NO_MOD_CODE) {
            return Some(ModFlags::empty());
        }
        MOD_CODES
            .iter()
            .find(|(_, c)| c.eq_ignore_ascii_case(code))
            .map(|(flag, _)| *flag)
    }

    /// Two-letter code of a single flag.
    pub fn code(self) -> Option<&'static str> {
        MOD_CODES
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, code)| *code)
    }

    /// `NC` implies `DT` on the wire; only `NC` is shown.
    pub fn to_display_string(self) -> String {
        let mut shown = self.intersection(ModFlags::all());
        if shown.contains(ModFlags::NIGHTCORE) {
            shown.remove(ModFlags::DOUBLE_TIME);
        }
        if shown.is_empty() {
            return NO_MOD_CODE.to_string();
        }
        MOD_CODES
            .iter()
            .filter(|(flag, _)| shown.contains(*flag))
            .map(|(_, code)| *code)
            .collect()
    }

    pub fn has_target_practice(self) -> bool {
        self.contains(ModFlags::TARGET_PRACTICE)
    }
}

impl Default for ModFlags {
    fn default() -> Self {
        ModFlags::empty()
    }
}

impl fmt::Display for ModFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl FromStr for ModFlags {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ModFlags::from_codes(s))
    }
}

impl Serialize for ModFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(ModFlags::from_bits_retain(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_hidden_double_time() {
        let mods = ModFlags::from_codes("hddt");
        assert_eq!(mods, ModFlags::HIDDEN | ModFlags::DOUBLE_TIME);
        assert_eq!(mods.to_display_string(), "HDDT");
    }

    #[test]
    fn it_parses_nightcore_alone() {
        assert_eq!(ModFlags::from_codes("nc"), ModFlags::NIGHTCORE);
    }

    #[test]
    fn it_hides_double_time_behind_nightcore() {
        let mods = ModFlags::NIGHTCORE | ModFlags::DOUBLE_TIME;
        assert_eq!(mods.to_display_string(), "NC");
        // the bitset itself is untouched
        assert!(mods.contains(ModFlags::DOUBLE_TIME));
        assert_eq!(mods.to_wire(), 576);
    }

    #[test]
    fn it_displays_the_empty_set_as_no_mod() {
        assert_eq!(ModFlags::empty().to_display_string(), "NM");
        assert_eq!(ModFlags::from_codes("NM"), ModFlags::empty());
    }

    #[test]
    fn it_ignores_unknown_codes() {
        assert_eq!(
            ModFlags::from_codes("HDxxHRzz"),
            ModFlags::HIDDEN | ModFlags::HARD_ROCK
        );
        // trailing odd character is not a code
        assert_eq!(ModFlags::from_codes("hdh"), ModFlags::HIDDEN);
    }

    #[test]
    fn it_parses_no_fail() {
        assert_eq!(ModFlags::from_codes("NFHD").to_wire(), 9);
    }

    #[test]
    fn it_displays_in_canonical_order() {
        let mods = ModFlags::from_codes("flhrhd");
        assert_eq!(mods.to_display_string(), "HDHRFL");
        assert_eq!(mods.to_string(), "HDHRFL");
    }

    #[test]
    fn it_maps_every_code_both_ways() {
        for (flag, code) in MOD_CODES {
            assert_eq!(flag.bits().count_ones(), 1);
            assert_eq!(ModFlags::from_code(code), Some(flag));
            assert_eq!(flag.code(), Some(code));
        }
        assert_eq!(ModFlags::all().bits(), 0x7fff_ffff);
    }

    #[test]
    fn it_composes_with_union_and_intersection() {
        let a = ModFlags::HIDDEN | ModFlags::HARD_ROCK;
        let b = ModFlags::HARD_ROCK | ModFlags::FLASHLIGHT;
        assert_eq!(a.intersection(b), ModFlags::HARD_ROCK);
        assert_eq!(a.union(b).to_display_string(), "HDHRFL");
    }

    #[test]
    fn it_keeps_unknown_wire_bits() {
        let mods = ModFlags::from_wire(i32::MIN | 8);
        assert!(mods.contains(ModFlags::HIDDEN));
        assert_eq!(mods.to_wire(), i32::MIN | 8);
    }

    #[test]
    fn it_serializes_as_raw_bits() {
        let mods = ModFlags::HIDDEN | ModFlags::TARGET_PRACTICE;
        let json = serde_json::to_string(&mods).unwrap();
        assert_eq!(json, "8388616");
        let back: ModFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mods);
        assert!(back.has_target_practice());
    }
}
