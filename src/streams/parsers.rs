use nom::{
    branch::alt,
    character::complete::{char, i32},
    combinator::{all_consuming, map, opt},
    number::complete::{double, float},
    sequence::{preceded, separated_pair, tuple},
    IResult,
};

use crate::replay::types::{InputFrame, Keys, LifeBarEntry};

/// Health used when an entry carries only a time offset.
pub const DEFAULT_HEALTH: f64 = 1.0;

/// `health,time` where an empty time means 0.
pub fn parse_health_and_time(input: &str) -> IResult<&str, LifeBarEntry> {
    map(
        separated_pair(double, char(','), opt(i32)),
        |(health, time_offset)| LifeBarEntry {
            health,
            time_offset: time_offset.unwrap_or(0),
        },
    )(input)
}

/// A bare time offset at full health.
pub fn parse_time_only(input: &str) -> IResult<&str, LifeBarEntry> {
    map(i32, |time_offset| LifeBarEntry {
        health: DEFAULT_HEALTH,
        time_offset,
    })(input)
}

/// One `|`-separated life-bar entry. Must consume the whole entry.
pub fn parse_life_bar_entry(input: &str) -> IResult<&str, LifeBarEntry> {
    alt((
        all_consuming(parse_health_and_time),
        all_consuming(parse_time_only),
    ))(input)
}

/// One `time_delta|x|y|keys` frame record. Must consume the whole record.
pub fn parse_frame_record(input: &str) -> IResult<&str, InputFrame> {
    all_consuming(map(
        tuple((
            i32,
            preceded(char('|'), float),
            preceded(char('|'), float),
            preceded(char('|'), i32),
        )),
        |(time_delta, x, y, keys)| InputFrame {
            time_delta,
            x,
            y,
            keys: Keys::from_wire(keys),
        },
    ))(input)
}
