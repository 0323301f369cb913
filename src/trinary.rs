//! Three-valued logic for answers that static inference cannot always settle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a semantic query: definitely yes, definitely no, or unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Maybe,
}

impl TriState {
    pub fn yes(self) -> bool {
        self == TriState::Yes
    }

    pub fn no(self) -> bool {
        self == TriState::No
    }

    /// Logical AND. `No` dominates, then `Maybe`.
    pub fn and(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::No, _) | (_, TriState::No) => TriState::No,
            (TriState::Yes, TriState::Yes) => TriState::Yes,
            _ => TriState::Maybe,
        }
    }

    /// `Yes` or `No` only when every operand agrees, `Maybe` otherwise.
    ///
    /// This is how a union answers a capability query: all members must
    /// agree before the union can answer definitely. An empty sequence is
    /// `Maybe`.
    pub fn extreme_identity(values: impl IntoIterator<Item = TriState>) -> TriState {
        let mut iter = values.into_iter();
        let first = match iter.next() {
            Some(v) => v,
            None => return TriState::Maybe,
        };
        if iter.all(|v| v == first) {
            first
        } else {
            TriState::Maybe
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::Yes => write!(f, "yes"),
            TriState::No => write!(f, "no"),
            TriState::Maybe => write!(f, "maybe"),
        }
    }
}
