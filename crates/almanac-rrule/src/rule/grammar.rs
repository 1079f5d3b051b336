//! Recurrence grammar: repeat kinds, weekday and ordinal vocabularies, and the
//! per-kind legality matrix consumed by the validator.

use std::fmt;

/// How a specification repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    /// A single, non-recurring event.
    None,
    /// Every day at a fixed set of hours.
    ByHour,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ByHour => "by_hour",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a repeat kind (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "by_hour" => Self::ByHour,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            _ => return None,
        })
    }

    /// Returns `true` for every kind except [`RepeatKind::None`].
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the row of the legality matrix for this kind.
    #[must_use]
    pub fn rules(self) -> &'static KindRules {
        let row = match self {
            Self::None => 0,
            Self::ByHour => 1,
            Self::Daily => 2,
            Self::Weekly => 3,
            Self::Monthly => 4,
            Self::Yearly => 5,
        };
        let matrix: &'static [KindRules; 6] = &LEGALITY;
        &matrix[row]
    }
}

impl fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the two-letter rule code.
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Picks the Nth matching date within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "first" => Self::First,
            "second" => Self::Second,
            "third" => Self::Third,
            "fourth" => Self::Fourth,
            "last" => Self::Last,
            _ => return None,
        })
    }

    /// Returns the BYSETPOS index for this ordinal.
    #[must_use]
    pub const fn set_position(self) -> i16 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Last => -1,
        }
    }
}

/// Symbolic weekday class usable as an `on_the` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayClass {
    /// Monday through Friday.
    Wkday,
    /// Saturday and Sunday.
    Wkend,
}

impl DayClass {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "wkday" => Self::Wkday,
            "wkend" => Self::Wkend,
            _ => return None,
        })
    }

    /// Expands the class in its fixed rule order (weekend lists Sunday first).
    #[must_use]
    pub const fn weekdays(self) -> &'static [Weekday] {
        match self {
            Self::Wkday => &[
                Weekday::Monday,
                Weekday::Tuesday,
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
            ],
            Self::Wkend => &[Weekday::Sunday, Weekday::Saturday],
        }
    }
}

/// Day qualifier for ordinal rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Class(DayClass),
    /// Explicit weekdays, kept in input order.
    Days(Vec<Weekday>),
}

impl Target {
    #[must_use]
    pub fn weekdays(&self) -> &[Weekday] {
        match self {
            Self::Class(class) => class.weekdays(),
            Self::Days(days) => days,
        }
    }
}

/// Specification fields that can carry validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Repeat,
    Description,
    Frequency,
    On,
    OnThe,
    Target,
    Until,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repeat => "repeat",
            Self::Description => "description",
            Self::Frequency => "frequency",
            Self::On => "on",
            Self::OnThe => "on_the",
            Self::Target => "target",
            Self::Until => "until",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape a present parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Positive integer interval multiplier.
    Interval,
    /// Collection of hours of the day (0-23).
    Hours,
    /// Collection of weekday codes.
    Weekdays,
    /// Collection of days of the month (1-31).
    MonthDays,
    /// Collection of months of the year (1-12).
    Months,
    /// One of `first`, `second`, `third`, `fourth`, `last`.
    Ordinal,
    /// A day class (`wkday`, `wkend`) or a collection of weekday codes.
    DayTarget,
}

/// Whether a parameter is legal for a repeat kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Forbidden,
    Optional(Shape),
    Required(Shape),
    /// Required when `on_the` is present, forbidden otherwise.
    WithOnThe(Shape),
}

/// One row of the legality matrix.
#[derive(Debug, Clone, Copy)]
pub struct KindRules {
    pub kind: RepeatKind,
    pub frequency: Presence,
    pub on: Presence,
    pub on_the: Presence,
    pub target: Presence,
    /// `on` and `on_the` cannot both be given.
    pub on_excludes_on_the: bool,
}

impl KindRules {
    /// Returns `true` when the kind takes an interval multiplier.
    #[must_use]
    pub const fn accepts_frequency(&self) -> bool {
        !matches!(self.frequency, Presence::Forbidden)
    }
}

/// Which recurrence parameters each repeat kind requires, accepts or rejects.
pub const LEGALITY: [KindRules; 6] = [
    KindRules {
        kind: RepeatKind::None,
        frequency: Presence::Forbidden,
        on: Presence::Forbidden,
        on_the: Presence::Forbidden,
        target: Presence::Forbidden,
        on_excludes_on_the: false,
    },
    KindRules {
        kind: RepeatKind::ByHour,
        frequency: Presence::Forbidden,
        on: Presence::Forbidden,
        on_the: Presence::Forbidden,
        target: Presence::Required(Shape::Hours),
        on_excludes_on_the: false,
    },
    KindRules {
        kind: RepeatKind::Daily,
        frequency: Presence::Optional(Shape::Interval),
        on: Presence::Forbidden,
        on_the: Presence::Forbidden,
        target: Presence::Forbidden,
        on_excludes_on_the: false,
    },
    KindRules {
        kind: RepeatKind::Weekly,
        frequency: Presence::Optional(Shape::Interval),
        on: Presence::Optional(Shape::Weekdays),
        on_the: Presence::Forbidden,
        target: Presence::Forbidden,
        on_excludes_on_the: false,
    },
    KindRules {
        kind: RepeatKind::Monthly,
        frequency: Presence::Optional(Shape::Interval),
        on: Presence::Optional(Shape::MonthDays),
        on_the: Presence::Optional(Shape::Ordinal),
        target: Presence::WithOnThe(Shape::DayTarget),
        on_excludes_on_the: true,
    },
    KindRules {
        kind: RepeatKind::Yearly,
        frequency: Presence::Optional(Shape::Interval),
        on: Presence::Optional(Shape::Months),
        on_the: Presence::Optional(Shape::Ordinal),
        target: Presence::WithOnThe(Shape::DayTarget),
        on_excludes_on_the: false,
    },
];
