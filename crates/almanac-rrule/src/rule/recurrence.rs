//! Validated, strongly-typed recurrence patterns.

use super::grammar::{Ordinal, RepeatKind, Target, Weekday};

/// "The Nth day matching a target" selector used by monthly and yearly rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nth {
    pub ordinal: Ordinal,
    pub target: Target,
}

/// A recurrence pattern that passed the legality matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    None,
    ByHour {
        hours: Vec<u8>,
    },
    Daily {
        interval: u16,
    },
    Weekly {
        interval: u16,
        days: Vec<Weekday>,
    },
    Monthly {
        interval: u16,
        days: Vec<u8>,
        nth: Option<Nth>,
    },
    Yearly {
        interval: u16,
        months: Vec<u8>,
        nth: Option<Nth>,
    },
}

impl Recurrence {
    #[must_use]
    pub const fn kind(&self) -> RepeatKind {
        match self {
            Self::None => RepeatKind::None,
            Self::ByHour { .. } => RepeatKind::ByHour,
            Self::Daily { .. } => RepeatKind::Daily,
            Self::Weekly { .. } => RepeatKind::Weekly,
            Self::Monthly { .. } => RepeatKind::Monthly,
            Self::Yearly { .. } => RepeatKind::Yearly,
        }
    }

    /// Target hours for `by_hour` rules, ascending and without duplicates.
    #[must_use]
    pub fn hours(&self) -> Option<Vec<u8>> {
        let Self::ByHour { hours } = self else {
            return None;
        };
        let mut sorted = hours.clone();
        sorted.sort_unstable();
        sorted.dedup();
        Some(sorted)
    }
}
