use crate::entity::{require_name, Draft, Entity};
use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SensorType {
    Humidity,
    Temperature,
    Ph,
    Flow,
    Pressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SensorCategory {
    Soil,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SensorStatus {
    Online,
    Offline,
    Warning,
}

impl Default for SensorStatus {
    fn default() -> Self {
        SensorStatus::Online
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub category: SensorCategory,
    pub value: f64,
    pub unit: String,
    pub status: SensorStatus,
    pub node_id: Option<i32>,
    pub valve_id: Option<i32>,
    pub battery_level: f64,
    pub location: String,
    pub last_reading: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Sensor {
    pub fn is_online(&self) -> bool {
        self.status == SensorStatus::Online
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSensor {
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub category: SensorCategory,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub status: SensorStatus,
    #[serde(default)]
    pub node_id: Option<i32>,
    #[serde(default)]
    pub valve_id: Option<i32>,
    #[serde(default = "full_battery")]
    pub battery_level: f64,
    #[serde(default)]
    pub location: String,
}

fn full_battery() -> f64 {
    100.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorPatch {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub status: Option<SensorStatus>,
    pub battery_level: Option<f64>,
    pub location: Option<String>,
}

impl Entity for Sensor {
    type Patch = SensorPatch;

    const KIND: &'static str = "sensor";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: SensorPatch) {
        if patch.value.is_some() {
            self.last_reading = Utc::now();
        }
        crate::merge_patch!(self, patch, name, value, unit, status, battery_level, location);
    }
}

impl Draft for NewSensor {
    type Entity = Sensor;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        if !(0.0..=100.0).contains(&self.battery_level) {
            return Err(ModelError::InvalidValue(
                "batteryLevel",
                format!("{}", self.battery_level),
            ));
        }
        Ok(())
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Sensor {
        Sensor {
            id,
            plot_id: self.plot_id,
            name: self.name,
            sensor_type: self.sensor_type,
            category: self.category,
            value: self.value.max(0.0),
            unit: self.unit,
            status: self.status,
            node_id: self.node_id,
            valve_id: self.valve_id,
            battery_level: self.battery_level,
            location: self.location,
            last_reading: now,
            created_at: now,
        }
    }
}
