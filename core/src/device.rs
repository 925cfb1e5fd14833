use crate::entity::{require_name, require_positive, Draft, Entity};
use crate::error::ModelError;
use crate::farm::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fallback flow (L/min) for a valve opened without a known flow
pub const DEFAULT_FLOW: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ValveState {
    Open,
    Closed,
    Partial,
    Error,
}

impl Default for ValveState {
    fn default() -> Self {
        ValveState::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Valve {
    pub id: i32,
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    pub device_id: String,
    pub state: ValveState,
    /// L/min
    pub flow_rate: f64,
    /// Flow restored when the valve gets opened
    pub nominal_flow: f64,
    /// bar
    pub pressure: f64,
    pub maintenance: bool,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Valve {
    pub fn is_active(&self) -> bool {
        matches!(self.state, ValveState::Open | ValveState::Partial)
    }

    /// Flips open/closed. Closing remembers the live flow as nominal flow,
    /// reopening restores it.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            if self.flow_rate > 0.0 {
                self.nominal_flow = self.flow_rate;
            }
            self.state = ValveState::Closed;
            self.flow_rate = 0.0;
        } else {
            self.state = ValveState::Open;
            self.flow_rate = self.nominal_flow;
        }
        self.last_activity = Some(now);
    }

    /// Opens for irrigation, keeping the current flow if there is one
    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.state = ValveState::Open;
        if self.flow_rate <= 0.0 {
            self.flow_rate = DEFAULT_FLOW;
        }
        self.last_activity = Some(now);
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.state = ValveState::Closed;
        self.flow_rate = 0.0;
        self.last_activity = Some(now);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewValve {
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub state: ValveState,
    #[serde(default)]
    pub flow_rate: f64,
    /// Defaults to the flow rate, or [`DEFAULT_FLOW`] for a closed valve
    pub nominal_flow: Option<f64>,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub maintenance: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValvePatch {
    pub name: Option<String>,
    pub device_id: Option<String>,
    pub state: Option<ValveState>,
    pub flow_rate: Option<f64>,
    pub nominal_flow: Option<f64>,
    pub pressure: Option<f64>,
    pub maintenance: Option<bool>,
}

impl Entity for Valve {
    type Patch = ValvePatch;

    const KIND: &'static str = "valve";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: ValvePatch) {
        crate::merge_patch!(
            self,
            patch,
            name,
            device_id,
            state,
            flow_rate,
            nominal_flow,
            pressure,
            maintenance
        );
        self.last_activity = Some(Utc::now());
    }
}

impl Draft for NewValve {
    type Entity = Valve;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        require_positive("flowRate", self.flow_rate)?;
        require_positive("pressure", self.pressure)
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Valve {
        let nominal_flow = match self.nominal_flow {
            Some(flow) => flow,
            None if self.flow_rate > 0.0 => self.flow_rate,
            None => DEFAULT_FLOW,
        };
        let device_id = if self.device_id.is_empty() {
            format!("VLV-{:04}", id)
        } else {
            self.device_id
        };
        Valve {
            id,
            farm_id: self.farm_id,
            plot_id: self.plot_id,
            name: self.name,
            device_id,
            state: self.state,
            flow_rate: self.flow_rate,
            nominal_flow,
            pressure: self.pressure,
            maintenance: self.maintenance,
            last_activity: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum NodeStatus {
    Online,
    Offline,
    Warning,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Online
    }
}

/// Gateway device carrying the soil and air sensors of a plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i32,
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    pub device_id: String,
    pub coordinates: Coordinate,
    pub status: NodeStatus,
    pub battery_level: f64,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    #[serde(rename = "loteId")]
    pub plot_id: i32,
    pub name: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub coordinates: Coordinate,
    #[serde(default)]
    pub status: NodeStatus,
    pub battery_level: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub name: Option<String>,
    pub device_id: Option<String>,
    pub coordinates: Option<Coordinate>,
    pub status: Option<NodeStatus>,
    pub battery_level: Option<f64>,
}

impl Entity for Node {
    type Patch = NodePatch;

    const KIND: &'static str = "node";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: NodePatch) {
        crate::merge_patch!(self, patch, name, device_id, coordinates, status, battery_level);
        self.last_activity = Utc::now();
    }
}

impl Draft for NewNode {
    type Entity = Node;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Node {
        let device_id = if self.device_id.is_empty() {
            format!("NODE-{:04}", id)
        } else {
            self.device_id
        };
        Node {
            id,
            farm_id: self.farm_id,
            plot_id: self.plot_id,
            name: self.name,
            device_id,
            coordinates: self.coordinates,
            status: self.status,
            battery_level: self.battery_level.unwrap_or(100.0),
            last_activity: now,
            created_at: now,
        }
    }
}
