//! Reminder data model.
//!
//! A [`Reminder`] is one medication with a recurring daily schedule made of
//! [`DoseSlot`]s. The serialized form keeps the camelCase field names of the
//! `medicineReminders` payload so existing data loads unchanged.

mod draft;
mod slot;

pub use draft::{ReminderDraft, SlotDraft};
pub use slot::{DosePeriod, DoseSlot, MealTiming};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a medicine is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThriceDaily,
    AsNeeded,
    Weekly,
}

impl Frequency {
    pub const ALL: [Frequency; 5] = [
        Frequency::OnceDaily,
        Frequency::TwiceDaily,
        Frequency::ThriceDaily,
        Frequency::AsNeeded,
        Frequency::Weekly,
    ];

    /// Number of dose slots the frequency implies.
    ///
    /// As-needed and weekly reminders carry no timed slots.
    pub fn slot_count(self) -> usize {
        match self {
            Frequency::OnceDaily => 1,
            Frequency::TwiceDaily => 2,
            Frequency::ThriceDaily => 3,
            Frequency::AsNeeded | Frequency::Weekly => 0,
        }
    }

    /// True for the N-times-daily variants.
    pub fn is_daily(self) -> bool {
        self.slot_count() > 0
    }

    /// Wire name, e.g. `twice-daily`.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::OnceDaily => "once-daily",
            Frequency::TwiceDaily => "twice-daily",
            Frequency::ThriceDaily => "thrice-daily",
            Frequency::AsNeeded => "as-needed",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::OnceDaily => "Once Daily",
            Frequency::TwiceDaily => "Twice Daily",
            Frequency::ThriceDaily => "Thrice Daily",
            Frequency::AsNeeded => "As Needed",
            Frequency::Weekly => "Weekly",
        };
        f.write_str(label)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown frequency '{s}' (expected one of: once-daily, twice-daily, \
                     thrice-daily, as-needed, weekly)"
                )
            })
    }
}

/// A medication reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Creation timestamp in epoch milliseconds, unique within a store.
    pub id: i64,
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub schedule: Vec<DoseSlot>,
    pub start_date: NaiveDate,
    #[serde(default, with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Reminder {
    /// Slots that carry a specific time, with their index in `schedule`.
    pub fn timed_slots(&self) -> impl Iterator<Item = (usize, &DoseSlot)> {
        self.schedule
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.specific_time.is_some())
    }

    /// `medicine - dosage`, the headline used in alerts.
    pub fn title(&self) -> String {
        if self.dosage.is_empty() {
            self.medicine_name.clone()
        } else {
            format!("{} - {}", self.medicine_name, self.dosage)
        }
    }
}

/// `endDate` is stored as `"YYYY-MM-DD"`; the empty string (or null) means open-ended.
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.collect_str(&d.format("%Y-%m-%d")),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
