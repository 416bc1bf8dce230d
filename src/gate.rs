//! Release gating for time-locked party content.
//!
//! Menus, drinks and games stay hidden until a party's release date. A
//! visitor holding `override=true` sees everything early. Identity cards
//! unlock one calendar day after everything else.

use chrono::{Local, NaiveDate};

/// The only query value that bypasses the gate.
const OVERRIDE_VALUE: &str = "true";

/// Source of "today" for gate decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Override(bool);

impl Override {
    pub fn from_query(value: Option<&str>) -> Override {
        Override(value == Some(OVERRIDE_VALUE))
    }

    pub fn is_set(self) -> bool {
        self.0
    }
}

pub fn is_available(today: NaiveDate, release: NaiveDate, override_flag: Option<&str>) -> bool {
    Gate::new(today, Override::from_query(override_flag)).opens(release)
}

pub fn identity_cards_available(
    today: NaiveDate,
    release: NaiveDate,
    override_flag: Option<&str>,
) -> bool {
    Gate::new(today, Override::from_query(override_flag)).identity_cards_open(release)
}

/// A single request's view of the release dates.
#[derive(Clone, Copy, Debug)]
pub struct Gate {
    today: NaiveDate,
    override_flag: Override,
}

impl Gate {
    pub fn new(today: NaiveDate, override_flag: Override) -> Gate {
        Gate {
            today,
            override_flag,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn is_overridden(&self) -> bool {
        self.override_flag.is_set()
    }

    pub fn opens(&self, release: NaiveDate) -> bool {
        self.is_overridden() || self.today >= release
    }

    pub fn identity_cards_open(&self, release: NaiveDate) -> bool {
        self.is_overridden()
            || identity_cards_release(release).map_or(false, |unlock| self.today >= unlock)
    }
}

/// The day identity cards unlock. `None` only past the end of the calendar.
pub fn identity_cards_release(release: NaiveDate) -> Option<NaiveDate> {
    release.succ_opt()
}

/// Hides text while keeping its shape: every non-whitespace character
/// becomes `?`.
pub fn redact(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { c } else { '?' })
        .collect()
}

/// Long-form date for "not yet available" messages, e.g. `June 1, 2025`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
