//! G-code subset parser.
//!
//! Recognized commands:
//!
//! | Code          | Meaning                                   |
//! |---------------|-------------------------------------------|
//! | `G1`          | Linear move, `X Y Z E` in mm, `F` in mm/min |
//! | `G92`         | Set coordinate offset for the given axes  |
//! | `G28`         | Home X, Y, Z                              |
//! | `M104`/`M109` | Nozzle set point, non-blocking / blocking |
//! | `M140`/`M190` | Plate set point, non-blocking / blocking  |
//!
//! A line is a sequence of words (`<letter><number>`), optionally mixed
//! with `( ... )` and `; ...` comments. A line that does not tokenize is
//! rejected as a whole; words that tokenize but name unsupported codes are
//! dropped silently.

use cnc_common::types::AxisId;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_until,
    character::complete::{char, digit0, digit1, multispace1, one_of, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize, rest, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};

/// Optional per-axis values in G-code units (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisWords {
    /// `X` word.
    pub x: Option<f64>,
    /// `Y` word.
    pub y: Option<f64>,
    /// `Z` word.
    pub z: Option<f64>,
    /// `E` word.
    pub e: Option<f64>,
}

impl AxisWords {
    /// Value given for `axis`, if any.
    pub fn get(&self, axis: AxisId) -> Option<f64> {
        match axis {
            AxisId::X => self.x,
            AxisId::Y => self.y,
            AxisId::Z => self.z,
            AxisId::E => self.e,
        }
    }

    /// True when no axis word is present.
    pub fn is_empty(&self) -> bool {
        AxisId::ALL.iter().all(|id| self.get(*id).is_none())
    }
}

/// One recognized command.
#[derive(Debug, Clone, PartialEq)]
pub enum GcodeCommand {
    /// `G1`: axis targets in mm, feed in mm/min.
    LinearMove {
        /// Target per axis.
        target: AxisWords,
        /// Feed rate.
        feed: Option<f64>,
    },
    /// `G92`: declare the current position of the given axes.
    SetOffset(AxisWords),
    /// `G28`: home X, Y and Z.
    Home,
    /// `M104` / `M109`.
    SetNozzleTemp {
        /// Set point [°C].
        celsius: f64,
        /// `M109` waits for the set point to settle.
        wait: bool,
    },
    /// `M140` / `M190`.
    SetPlateTemp {
        /// Set point [°C].
        celsius: f64,
        /// `M190` waits for the set point to settle.
        wait: bool,
    },
}

/// One `<letter><number>` word.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Word {
    letter: char,
    value: f64,
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
        )),
        str::parse::<f64>,
    )
    .parse(input)
}

fn word(input: &str) -> IResult<&str, Word> {
    map(
        pair(satisfy(|c: char| c.is_ascii_alphabetic()), number),
        |(letter, value)| Word {
            letter: letter.to_ascii_uppercase(),
            value,
        },
    )
    .parse(input)
}

/// Whitespace and comments between words.
fn filler(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), delimited(char('('), take_until(")"), char(')'))),
            value((), preceded(char(';'), rest)),
        ))),
    )
    .parse(input)
}

fn words(input: &str) -> IResult<&str, Vec<Word>> {
    all_consuming(terminated(many0(preceded(filler, word)), filler)).parse(input)
}

/// Code word and the parameter words that follow it.
#[derive(Debug, Default)]
struct Block {
    letter: char,
    code: f64,
    axes: AxisWords,
    f: Option<f64>,
    s: Option<f64>,
}

impl Block {
    fn is(&self, letter: char, code: u16) -> bool {
        self.letter == letter && self.code == f64::from(code)
    }

    fn into_command(self) -> Option<GcodeCommand> {
        if self.is('G', 1) {
            Some(GcodeCommand::LinearMove {
                target: self.axes,
                feed: self.f,
            })
        } else if self.is('G', 92) {
            Some(GcodeCommand::SetOffset(self.axes))
        } else if self.is('G', 28) {
            Some(GcodeCommand::Home)
        } else if self.is('M', 104) || self.is('M', 109) {
            let wait = self.is('M', 109);
            self.s
                .map(|celsius| GcodeCommand::SetNozzleTemp { celsius, wait })
        } else if self.is('M', 140) || self.is('M', 190) {
            let wait = self.is('M', 190);
            self.s
                .map(|celsius| GcodeCommand::SetPlateTemp { celsius, wait })
        } else {
            None
        }
    }
}

/// Parse one line into the commands it contains, in order.
///
/// Returns `None` when the line is not valid G-code. An empty or
/// comment-only line yields an empty list.
pub fn parse_line(line: &str) -> Option<Vec<GcodeCommand>> {
    let (_, words) = words(line).ok()?;

    let mut blocks: Vec<Block> = Vec::new();
    for w in words {
        match w.letter {
            'G' | 'M' => blocks.push(Block {
                letter: w.letter,
                code: w.value,
                ..Block::default()
            }),
            // Parameters before the first code word (line numbers etc.) are ignored.
            letter => {
                let Some(block) = blocks.last_mut() else {
                    continue;
                };
                match letter {
                    'X' => block.axes.x = Some(w.value),
                    'Y' => block.axes.y = Some(w.value),
                    'Z' => block.axes.z = Some(w.value),
                    'E' => block.axes.e = Some(w.value),
                    'F' => block.f = Some(w.value),
                    'S' => block.s = Some(w.value),
                    _ => {}
                }
            }
        }
    }

    Some(blocks.into_iter().filter_map(Block::into_command).collect())
}

// ─── Tests ──────────────────────────────────────────────────────────
