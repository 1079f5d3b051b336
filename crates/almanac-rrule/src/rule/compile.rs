//! Canonical rule strings.
//!
//! A [`CompiledRule`] renders to the persisted, byte-comparable rule string.
//! Component order is fixed: `FREQ`, `INTERVAL`, `BYHOUR`, `BYMONTH`,
//! `BYMONTHDAY`, `BYSETPOS`, `BYDAY`, `UNTIL`.

use std::fmt;

use chrono::{DateTime, Utc};

use super::grammar::Weekday;
use super::recurrence::{Nth, Recurrence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

/// Structured form of a canonical rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub freq: Frequency,
    /// Absent for `by_hour` rules.
    pub interval: Option<u16>,
    /// Ascending, deduplicated.
    pub by_hour: Vec<u8>,
    pub by_month: Vec<u8>,
    pub by_month_day: Vec<u8>,
    pub by_set_pos: Option<i16>,
    pub by_day: Vec<Weekday>,
    pub until: Option<DateTime<Utc>>,
}

impl CompiledRule {
    fn new(freq: Frequency, interval: Option<u16>) -> Self {
        Self {
            freq,
            interval,
            by_hour: Vec::new(),
            by_month: Vec::new(),
            by_month_day: Vec::new(),
            by_set_pos: None,
            by_day: Vec::new(),
            until: None,
        }
    }

    fn with_nth(mut self, nth: Option<&Nth>) -> Self {
        if let Some(nth) = nth {
            self.by_set_pos = Some(nth.ordinal.set_position());
            self.by_day = nth.target.weekdays().to_vec();
        }
        self
    }

    /// Same rule with the `UNTIL` bound dropped. Expansion applies the bound
    /// itself, in UTC, independent of the zone the rule is evaluated in.
    #[must_use]
    pub fn without_until(&self) -> Self {
        Self {
            until: None,
            ..self.clone()
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, values: &[T]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    write!(f, ";{name}=")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.freq.as_str())?;
        if let Some(interval) = self.interval {
            write!(f, ";INTERVAL={interval}")?;
        }
        join(f, "BYHOUR", &self.by_hour)?;
        join(f, "BYMONTH", &self.by_month)?;
        join(f, "BYMONTHDAY", &self.by_month_day)?;
        if let Some(pos) = self.by_set_pos {
            write!(f, ";BYSETPOS={pos}")?;
        }
        join(f, "BYDAY", &self.by_day)?;
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.format("%Y%m%dT%H%M%S"))?;
        }
        Ok(())
    }
}

/// ## Summary
/// Compiles a validated recurrence into its canonical rule.
///
/// Returns `None` for non-recurring specifications.
#[must_use]
pub fn compile(recurrence: &Recurrence, until: Option<DateTime<Utc>>) -> Option<CompiledRule> {
    let rule = match recurrence {
        Recurrence::None => return None,
        Recurrence::ByHour { .. } => CompiledRule {
            by_hour: recurrence.hours().unwrap_or_default(),
            ..CompiledRule::new(Frequency::Daily, None)
        },
        Recurrence::Daily { interval } => CompiledRule::new(Frequency::Daily, Some(*interval)),
        Recurrence::Weekly { interval, days } => CompiledRule {
            by_day: days.clone(),
            ..CompiledRule::new(Frequency::Weekly, Some(*interval))
        },
        Recurrence::Monthly {
            interval,
            days,
            nth,
        } => CompiledRule {
            by_month_day: days.clone(),
            ..CompiledRule::new(Frequency::Monthly, Some(*interval))
        }
        .with_nth(nth.as_ref()),
        Recurrence::Yearly {
            interval,
            months,
            nth,
        } => CompiledRule {
            by_month: months.clone(),
            ..CompiledRule::new(Frequency::Yearly, Some(*interval))
        }
        .with_nth(nth.as_ref()),
    };

    Some(CompiledRule { until, ..rule })
}
