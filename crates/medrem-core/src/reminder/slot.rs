use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse part of the day a dose belongs to. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DosePeriod {
    Morning,
    Afternoon,
    Night,
}

impl fmt::Display for DosePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DosePeriod::Morning => "Morning",
            DosePeriod::Afternoon => "Afternoon",
            DosePeriod::Night => "Night",
        })
    }
}

impl FromStr for DosePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(DosePeriod::Morning),
            "afternoon" => Ok(DosePeriod::Afternoon),
            "night" => Ok(DosePeriod::Night),
            other => Err(format!(
                "unknown period '{other}' (expected morning, afternoon or night)"
            )),
        }
    }
}

/// Dose timing relative to a meal. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealTiming {
    Before,
    After,
    Anytime,
}

impl fmt::Display for MealTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MealTiming::Before => "Before Meal",
            MealTiming::After => "After Meal",
            MealTiming::Anytime => "Anytime",
        })
    }
}

impl FromStr for MealTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(MealTiming::Before),
            "after" => Ok(MealTiming::After),
            "anytime" => Ok(MealTiming::Anytime),
            other => Err(format!(
                "unknown meal timing '{other}' (expected before, after or anytime)"
            )),
        }
    }
}

/// One scheduled administration within a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseSlot {
    pub time: DosePeriod,
    pub meal: MealTiming,
    /// Wall-clock time of day the dose fires at. Slots without one never fire.
    #[serde(default, with = "hhmm")]
    pub specific_time: Option<NaiveTime>,
    /// Most recent firing; guards against a second firing on the same day.
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

impl DoseSlot {
    pub fn new(time: DosePeriod, meal: MealTiming, specific_time: Option<NaiveTime>) -> Self {
        Self {
            time,
            meal,
            specific_time,
            last_triggered: None,
        }
    }

    /// Minute of day (0..1440) of the specific time, if any.
    pub fn minute_of_day(&self) -> Option<u32> {
        self.specific_time.map(|t| crate::schedule::minute_of_day(&t))
    }

    /// Record a firing at `at`. An earlier instant never replaces a later one.
    pub fn mark_triggered(&mut self, at: DateTime<Utc>) {
        self.last_triggered = Some(match self.last_triggered {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }
}

/// `specificTime` is stored as `"HH:MM"`; the empty string means unset.
mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.collect_str(&t.format("%H:%M")),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                // Due matching works on whole minutes.
                .map(|t| t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
