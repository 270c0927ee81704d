//! Labels carried by regions during reduction

use floodmax_core::Rank;
use std::fmt;

/// Label of a region while ranks are being reduced.
///
/// Only `Rank` labels may reach the output. `Accumulated` marks the union of
/// everything already folded into the result; `ExtraPending` marks extra
/// category coverage whose rank has not been recovered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Rank(Rank),
    Accumulated,
    ExtraPending,
}

impl Label {
    /// The rank, if this is a final label
    pub fn rank(self) -> Option<Rank> {
        match self {
            Label::Rank(r) => Some(r),
            Label::Accumulated | Label::ExtraPending => None,
        }
    }
}

impl From<Rank> for Label {
    fn from(rank: Rank) -> Self {
        Label::Rank(rank)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Rank(r) => write!(f, "rank {}", r),
            Label::Accumulated => write!(f, "accumulated"),
            Label::ExtraPending => write!(f, "extra (pending)"),
        }
    }
}
