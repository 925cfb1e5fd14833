use crate::entity::{Draft, Entity};
use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    pub fn new(severity: Severity, title: &str, message: String) -> Self {
        NewNotification {
            severity,
            title: title.to_owned(),
            message,
        }
    }
}

impl Entity for Notification {
    type Patch = ();

    const KIND: &'static str = "notification";

    fn id(&self) -> i32 {
        self.id
    }

    /// Being read is the only change a notification knows
    fn apply(&mut self, _: ()) {
        self.read = true;
    }
}

impl Draft for NewNotification {
    type Entity = Notification;

    fn validate(&self) -> Result<(), ModelError> {
        if self.title.trim().is_empty() {
            return Err(ModelError::MissingField("title"));
        }
        Ok(())
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            severity: self.severity,
            title: self.title,
            message: self.message,
            read: false,
            created_at: now,
        }
    }
}

/// Summary refreshed on every telemetry tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub last_update: DateTime<Utc>,
    /// Percent, kept within [90, 100]
    pub connectivity: f64,
    pub online_sensors: usize,
    pub total_sensors: usize,
    pub active_valves: usize,
    pub total_valves: usize,
}

impl std::default::Default for SystemStatus {
    fn default() -> Self {
        SystemStatus {
            last_update: Utc::now(),
            connectivity: 98.0,
            online_sensors: 0,
            total_sensors: 0,
            active_valves: 0,
            total_valves: 0,
        }
    }
}
