//! Line classification for zkASM ecrecover traces.
//!
//! Each trimmed line falls into exactly one [`LineClass`]. Classification only
//! looks at the line itself; ordering rules live in `block_scanner`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::vector_params::{PRECOMPILED_MARKER, TX_MARKER};

lazy_static! {
    /// Matches: 0x<hex>[n] => <Letter>
    static ref RE_HEX_ASSIGN: Regex =
        Regex::new(r"^(0x[0-9a-fA-F]+)n?\s*=>\s*([A-Z])$").unwrap();
    /// Matches: 0x<hex>[n] : ASSERT...
    static ref RE_ASSERT: Regex = Regex::new(r"^(0x[0-9a-fA-F]+)n?\s*:\s*ASSERT").unwrap();
}

/// Input register of the recovery routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// message hash
    A,
    /// signature r
    B,
    /// signature s
    C,
    /// recovery id (v)
    D,
}

impl Slot {
    pub fn from_letter(letter: char) -> Option<Slot> {
        match letter {
            'A' => Some(Slot::A),
            'B' => Some(Slot::B),
            'C' => Some(Slot::C),
            'D' => Some(Slot::D),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineClass {
    /// `hex_value` is lower-cased, keeps its `0x` prefix, literal suffix removed.
    /// `slot` is `None` for letters outside A..=D.
    HexAssignment { hex_value: String, slot: Option<Slot> },
    CallInvocation { precompiled: bool },
    AssertionLine { hex_value: String },
    Blank,
    Other,
}

pub fn is_hex_line(line: &str) -> bool {
    RE_HEX_ASSIGN.is_match(line)
}

pub fn is_assert_line(line: &str) -> bool {
    RE_ASSERT.is_match(line)
}

pub fn classify_line(line: &str) -> LineClass {
    let line = line.trim();

    if line.is_empty() {
        return LineClass::Blank;
    }

    if let Some(caps) = RE_HEX_ASSIGN.captures(line) {
        let (Some(hex), Some(letter)) = (caps.get(1), caps.get(2)) else {
            return LineClass::Other;
        };
        let slot = letter.as_str().chars().next().and_then(Slot::from_letter);
        return LineClass::HexAssignment {
            hex_value: hex.as_str().to_ascii_lowercase(),
            slot,
        };
    }

    if line.starts_with(":CALL") {
        return if line.contains(PRECOMPILED_MARKER) {
            LineClass::CallInvocation { precompiled: true }
        } else if line.contains(TX_MARKER) {
            LineClass::CallInvocation { precompiled: false }
        } else {
            LineClass::Other
        };
    }

    if let Some(hex) = RE_ASSERT.captures(line).and_then(|caps| caps.get(1)) {
        return LineClass::AssertionLine {
            hex_value: hex.as_str().to_ascii_lowercase(),
        };
    }

    LineClass::Other
}
