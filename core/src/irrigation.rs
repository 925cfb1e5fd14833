use crate::entity::{require_name, Draft, Entity};
use crate::error::ModelError;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Daily,
    EveryOtherDay,
    Weekly,
}

impl Frequency {
    pub fn period(&self) -> Duration {
        match self {
            Frequency::Daily => Duration::days(1),
            Frequency::EveryOtherDay => Duration::days(2),
            Frequency::Weekly => Duration::weeks(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: i32,
    pub name: String,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub valve_id: i32,
    pub start_time: NaiveTime,
    /// Minutes
    pub duration: u32,
    pub frequency: Frequency,
    pub active: bool,
    pub next_execution: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    /// Rolls an elapsed execution forward by whole periods
    pub fn advance(&mut self, now: DateTime<Utc>) {
        let period = self.frequency.period();
        while self.next_execution <= now {
            self.next_execution = self.next_execution + period;
        }
    }
}

/// First occurrence of `start_time` strictly after `now`
pub fn next_run(start_time: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive().and_time(start_time).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub name: String,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub valve_id: i32,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub frequency: Frequency,
    #[serde(default = "enabled")]
    pub active: bool,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub duration: Option<u32>,
    pub frequency: Option<Frequency>,
    pub active: Option<bool>,
}

impl Entity for Schedule {
    type Patch = SchedulePatch;

    const KIND: &'static str = "schedule";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: SchedulePatch) {
        let moved = patch.start_time.is_some();
        crate::merge_patch!(self, patch, name, start_time, duration, frequency, active);
        if moved {
            self.next_execution = next_run(self.start_time, Utc::now());
        }
    }
}

impl Draft for NewSchedule {
    type Entity = Schedule;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        if self.duration == 0 {
            return Err(ModelError::InvalidValue("duration", "0".to_owned()));
        }
        Ok(())
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Schedule {
        Schedule {
            id,
            name: self.name,
            plot_id: self.plot_id,
            valve_id: self.valve_id,
            start_time: self.start_time,
            duration: self.duration,
            frequency: self.frequency,
            active: self.active,
            next_execution: next_run(self.start_time, now),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Advisory irrigation recommendation for a plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub priority: Priority,
    pub reason: String,
    /// Minutes
    pub recommended_duration: u32,
    /// Liters
    pub estimated_water_usage: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSuggestion {
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub priority: Priority,
    pub reason: String,
    pub recommended_duration: u32,
    pub estimated_water_usage: f64,
}

impl Entity for Suggestion {
    type Patch = ();

    const KIND: &'static str = "suggestion";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, _: ()) {}
}

impl Draft for NewSuggestion {
    type Entity = Suggestion;

    fn validate(&self) -> Result<(), ModelError> {
        if self.reason.trim().is_empty() {
            return Err(ModelError::MissingField("reason"));
        }
        Ok(())
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id,
            plot_id: self.plot_id,
            priority: self.priority,
            reason: self.reason,
            recommended_duration: self.recommended_duration,
            estimated_water_usage: self.estimated_water_usage,
            created_at: now,
        }
    }
}
