//! Option slots A-H and the per-record present mask.

use crate::sanitize::{clean_html, is_effectively_empty, value_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Number of lettered option slots a record can carry.
pub const SLOT_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Letter {
    pub const ALL: [Letter; SLOT_COUNT] = [
        Letter::A,
        Letter::B,
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::H,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Letter> {
        Self::ALL.get(index).copied()
    }

    /// Case-insensitive lookup of a single letter.
    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'H' => Some(Letter::H),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Record field holding this slot's text, e.g. `optionC`.
    pub fn field_name(self) -> String {
        format!("option{}", self.as_char())
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Which of the eight slots carry non-empty text for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentMask([bool; SLOT_COUNT]);

impl PresentMask {
    /// Every slot present.
    pub fn all() -> Self {
        Self([true; SLOT_COUNT])
    }

    /// Mask with exactly the given letters present.
    pub fn from_letters(letters: &[Letter]) -> Self {
        let mut slots = [false; SLOT_COUNT];
        for letter in letters {
            slots[letter.index()] = true;
        }
        Self(slots)
    }

    /// Presence is judged on the raw slot value: `&nbsp;` and full-width
    /// spaces count as whitespace, markup does not.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let mut slots = [false; SLOT_COUNT];
        for letter in Letter::ALL {
            let raw = value_text(record.get(&letter.field_name()));
            slots[letter.index()] = !is_effectively_empty(raw.as_deref());
        }
        Self(slots)
    }

    pub fn is_present(&self, letter: Letter) -> bool {
        self.0[letter.index()]
    }

    /// True if any of E-H is present.
    pub fn has_extended(&self) -> bool {
        self.0[4..].iter().any(|p| *p)
    }

    pub fn present_letters(&self) -> Vec<Letter> {
        Letter::ALL
            .into_iter()
            .filter(|l| self.is_present(*l))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub letter: Letter,
    pub text: String,
}

/// Present options of a record in A-H order, plus the mask they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOptions {
    pub mask: PresentMask,
    pub entries: Vec<OptionEntry>,
}

impl ExtractedOptions {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn text_of(&self, letter: Letter) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.letter == letter)
            .map(|e| e.text.as_str())
    }
}

/// Read the eight option slots of a record.
///
/// The mask is computed from the raw values before any cleanup. Entries hold
/// the sanitized text of every present slot, which may itself be empty when
/// a slot held nothing but markup.
pub fn extract_options(record: &Map<String, Value>) -> ExtractedOptions {
    let mask = PresentMask::from_record(record);
    let entries = Letter::ALL
        .into_iter()
        .filter(|l| mask.is_present(*l))
        .map(|letter| OptionEntry {
            letter,
            text: clean_html(value_text(record.get(&letter.field_name())).as_deref()),
        })
        .collect();
    ExtractedOptions { mask, entries }
}
