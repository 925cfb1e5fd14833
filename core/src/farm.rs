use crate::entity::{require_name, require_positive, Draft, Entity};
use crate::error::ModelError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum FarmStatus {
    Active,
    Inactive,
    Maintenance,
}

impl Default for FarmStatus {
    fn default() -> Self {
        FarmStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: i32,
    pub name: String,
    pub location: String,
    /// Hectares
    pub area: f64,
    pub coordinates: Coordinate,
    pub status: FarmStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewFarm {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub coordinates: Coordinate,
    #[serde(default)]
    pub status: FarmStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub area: Option<f64>,
    pub coordinates: Option<Coordinate>,
    pub status: Option<FarmStatus>,
}

impl Entity for Farm {
    type Patch = FarmPatch;

    const KIND: &'static str = "farm";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: FarmPatch) {
        crate::merge_patch!(self, patch, name, location, area, coordinates, status);
    }
}

impl Draft for NewFarm {
    type Entity = Farm;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        require_positive("area", self.area)
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Farm {
        Farm {
            id,
            name: self.name,
            location: self.location,
            area: self.area,
            coordinates: self.coordinates,
            status: self.status,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[serde(rename = "type")]
    pub crop_type: String,
    pub variety: Option<String>,
    pub planted_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plot {
    pub id: i32,
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    pub name: String,
    pub area: f64,
    pub crop: Crop,
    pub boundary: Vec<Coordinate>,
    pub center: Coordinate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPlot {
    #[serde(rename = "fincaId")]
    pub farm_id: i32,
    pub name: String,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub crop: Crop,
    #[serde(default)]
    pub boundary: Vec<Coordinate>,
    /// Derived from the boundary when absent
    pub center: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlotPatch {
    pub name: Option<String>,
    pub area: Option<f64>,
    pub crop: Option<Crop>,
    pub boundary: Option<Vec<Coordinate>>,
    pub center: Option<Coordinate>,
}

impl Entity for Plot {
    type Patch = PlotPatch;

    const KIND: &'static str = "plot";

    fn id(&self) -> i32 {
        self.id
    }

    fn apply(&mut self, patch: PlotPatch) {
        crate::merge_patch!(self, patch, name, area, crop, boundary, center);
    }
}

impl Draft for NewPlot {
    type Entity = Plot;

    fn validate(&self) -> Result<(), ModelError> {
        require_name(&self.name)?;
        require_positive("area", self.area)
    }

    fn build(self, id: i32, now: DateTime<Utc>) -> Plot {
        let center = self.center.unwrap_or_else(|| centroid(&self.boundary));
        Plot {
            id,
            farm_id: self.farm_id,
            name: self.name,
            area: self.area,
            crop: self.crop,
            boundary: self.boundary,
            center,
            created_at: now,
        }
    }
}

/// Vertex average of a boundary, origin for an empty one
pub fn centroid(boundary: &[Coordinate]) -> Coordinate {
    if boundary.is_empty() {
        return Coordinate::default();
    }
    let count = boundary.len() as f64;
    let (lat, lng) = boundary
        .iter()
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
    Coordinate {
        lat: lat / count,
        lng: lng / count,
    }
}
