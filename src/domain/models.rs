use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Regular,
    Recurring,
    Progress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub theme_color: String,
    pub kind: TaskKind,
    #[serde(default)]
    pub progress: u8,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeat_weekdays: Vec<u8>,
    #[serde(default, with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        if self.progress > 100 {
            return Err("task.progress must be within 0..=100".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err("task.start_date must not be after task.end_date".to_string());
            }
        }
        for code in &self.repeat_weekdays {
            if !(1..=7).contains(code) {
                return Err(format!(
                    "task.repeat_weekdays values must be 1..=7, got {code}"
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err("task.end_time must be after task.start_time".to_string());
            }
        }
        Ok(())
    }

    /// Default daily placement, present only for fixed-time tasks.
    pub fn fixed_slot(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_untimed(&self) -> bool {
        self.fixed_slot().is_none()
    }

    /// Recurrence predicate: whether this task generates an occurrence on
    /// `date` by itself. Tasks without repeat weekdays never self-generate;
    /// they only appear through explicit schedule records.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        if self.repeat_weekdays.is_empty() {
            return false;
        }
        self.repeat_weekdays.contains(&weekday_code(date.weekday()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub id: String,
    pub task_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl ScheduleRecord {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "record.id")?;
        validate_non_empty(&self.task_id, "record.task_id")?;
        if self.end_time <= self.start_time {
            return Err("record.end_time must be after record.start_time".to_string());
        }
        Ok(())
    }

    pub fn occupies(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.date == date && self.start_time == start && self.end_time == end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task_id: String,
    pub record_id: String,
    pub title: String,
    pub theme_color: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_completed: bool,
    pub task_type: TaskKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub occurrences: Vec<ScheduledTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub week_start: NaiveDate,
    pub days: Vec<DailySchedule>,
}

/// ISO weekday code, Monday=1 through Sunday=7.
pub fn weekday_code(weekday: Weekday) -> u8 {
    weekday.number_from_monday() as u8
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
            .map_err(|error| serde::de::Error::custom(format!("invalid HH:MM time: {error}")))
    }
}

mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    // Upstream payloads use an empty string for "no time", so both null and
    // "" deserialize to None.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        NaiveTime::parse_from_str(trimmed, FORMAT)
            .map(Some)
            .map_err(|error| serde::de::Error::custom(format!("invalid HH:MM time: {error}")))
    }
}
