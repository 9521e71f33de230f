//! Answer decoding.
//!
//! The `answer` field of a scraped record arrives in one of several
//! encodings:
//!
//! - a letter string such as `"B"` or `"AC"`,
//! - a bitmask integer where bit `i` marks option `i` (A=1, B=2, C=4, ...),
//!   sometimes sitting one nibble too high on four-option records,
//! - an ordinal integer `1..=8` naming a single option.
//!
//! [`decode_answer`] tries a fixed list of strategies in priority order and
//! returns the first non-empty letter set. Every strategy filters through the
//! record's [`PresentMask`], so a decoded letter always names a present slot.

use crate::options::{Letter, PresentMask, SLOT_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const LOW_NIBBLE: i128 = 0x0F;
const HIGH_NIBBLE: i128 = 0xF0;
const BYTE: i128 = 0xFF;
const NIBBLE_BITS: u32 = 4;

/// The raw `answer` value of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnswer {
    Text(String),
    Integer(i128),
    Absent,
    /// Floats, booleans, arrays and objects. Never decodes.
    Other,
}

impl RawAnswer {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RawAnswer::Absent,
            Some(Value::String(s)) => RawAnswer::Text(s.clone()),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    RawAnswer::Integer(i as i128)
                } else if let Some(u) = n.as_u64() {
                    RawAnswer::Integer(u as i128)
                } else {
                    RawAnswer::Other
                }
            }
            Some(_) => RawAnswer::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    Text,
    ShiftedBitmask,
    DirectBitmask,
    LowNibbleBitmask,
    Ordinal,
    /// Picked by the text-similarity fallback, not by decoding.
    Fallback,
    Unresolved,
}

impl DecodeStrategy {
    /// Integer strategies in the order they are attempted.
    pub const INTEGER_ORDER: [DecodeStrategy; 4] = [
        DecodeStrategy::ShiftedBitmask,
        DecodeStrategy::DirectBitmask,
        DecodeStrategy::LowNibbleBitmask,
        DecodeStrategy::Ordinal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStrategy::Text => "text",
            DecodeStrategy::ShiftedBitmask => "shifted_bitmask",
            DecodeStrategy::DirectBitmask => "direct_bitmask",
            DecodeStrategy::LowNibbleBitmask => "low_nibble_bitmask",
            DecodeStrategy::Ordinal => "ordinal",
            DecodeStrategy::Fallback => "fallback",
            DecodeStrategy::Unresolved => "unresolved",
        }
    }

    /// Apply one integer strategy. `None` means the strategy's preconditions
    /// did not hold or it produced no letters.
    fn apply_integer(
        self,
        value: i128,
        mask: &PresentMask,
        opts: &DecoderOptions,
    ) -> Option<Vec<Letter>> {
        let four_options_only = !mask.has_extended();
        let low4 = value & LOW_NIBBLE;
        let high4 = value & HIGH_NIBBLE;

        let picked = match self {
            DecodeStrategy::ShiftedBitmask => {
                if !(opts.allow_shift && four_options_only && low4 == 0 && high4 != 0) {
                    return None;
                }
                bitmask_to_letters(value >> NIBBLE_BITS, mask)
            }
            DecodeStrategy::DirectBitmask => bitmask_to_letters(value, mask),
            DecodeStrategy::LowNibbleBitmask => {
                if !(four_options_only && low4 != 0) {
                    return None;
                }
                bitmask_to_letters(low4, mask)
            }
            DecodeStrategy::Ordinal => {
                if !(1..=SLOT_COUNT as i128).contains(&value) {
                    return None;
                }
                Letter::from_index((value - 1) as usize)
                    .filter(|l| mask.is_present(*l))
                    .into_iter()
                    .collect()
            }
            _ => return None,
        };

        if picked.is_empty() {
            None
        } else {
            Some(picked)
        }
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderOptions {
    /// Enable the right-shift-by-four heuristic for four-option records.
    pub allow_shift: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self { allow_shift: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub letters: Vec<Letter>,
    pub strategy: DecodeStrategy,
}

impl Decoded {
    pub fn unresolved() -> Self {
        Self {
            letters: Vec::new(),
            strategy: DecodeStrategy::Unresolved,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

/// Interpret the low byte of `value` as a bitmask over A-H.
fn bitmask_to_letters(value: i128, mask: &PresentMask) -> Vec<Letter> {
    let byte = value & BYTE;
    Letter::ALL
        .into_iter()
        .filter(|l| byte & (1 << l.index()) != 0 && mask.is_present(*l))
        .collect()
}

/// Keep the present A-H letters of a string in the order they appear.
/// A repeated letter is kept once.
fn decode_text(text: &str, mask: &PresentMask) -> Vec<Letter> {
    let mut picked: Vec<Letter> = Vec::new();
    for c in text.trim().chars().flat_map(char::to_uppercase) {
        if let Some(letter) = Letter::from_char(c).filter(|l| mask.is_present(*l)) {
            if !picked.contains(&letter) {
                picked.push(letter);
            }
        }
    }
    picked
}

/// Decode a raw answer against a record's present mask.
///
/// Never fails: an answer that no strategy can read yields
/// [`Decoded::unresolved`]. A text answer is final even when it decodes to
/// nothing; integer strategies fall through until one yields letters.
pub fn decode_answer(answer: &RawAnswer, mask: &PresentMask, opts: &DecoderOptions) -> Decoded {
    match answer {
        RawAnswer::Text(text) => {
            let letters = decode_text(text, mask);
            if letters.is_empty() {
                Decoded::unresolved()
            } else {
                Decoded {
                    letters,
                    strategy: DecodeStrategy::Text,
                }
            }
        }
        RawAnswer::Integer(value) => DecodeStrategy::INTEGER_ORDER
            .into_iter()
            .find_map(|strategy| {
                strategy
                    .apply_integer(*value, mask, opts)
                    .map(|letters| Decoded { letters, strategy })
            })
            .unwrap_or_else(Decoded::unresolved),
        RawAnswer::Absent | RawAnswer::Other => Decoded::unresolved(),
    }
}
