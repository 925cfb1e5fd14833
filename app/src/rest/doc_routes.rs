use crate::backend::dto::{LoginRequest, SensorReading};
use riego_core::{
    Coordinate, Crop, Farm, FarmPatch, FarmStatus, Frequency, NewFarm, NewNode, NewPlot,
    NewSchedule, NewSensor, NewUser, NewValve, Node, NodePatch, NodeStatus, Notification, Plot,
    PlotPatch, Priority, Role, Schedule, SchedulePatch, Sensor, SensorCategory, SensorPatch,
    SensorStatus, SensorType, Severity, Suggestion, SystemStatus, User, UserPatch, Valve,
    ValvePatch, ValveState,
};
use std::sync::Arc;
use utoipa::OpenApi;
use warp::Filter;

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        User, Role, NewUser, UserPatch,
        Farm, FarmStatus, Coordinate, NewFarm, FarmPatch,
        Plot, Crop, NewPlot, PlotPatch,
        Valve, ValveState, NewValve, ValvePatch,
        Node, NodeStatus, NewNode, NodePatch,
        Sensor, SensorType, SensorCategory, SensorStatus, NewSensor, SensorPatch,
        Schedule, Frequency, NewSchedule, SchedulePatch,
        Suggestion, Priority,
        Notification, Severity, SystemStatus,
        LoginRequest, SensorReading,
    )),
    tags((name = "riego", description = "Irrigation console state"))
)]
struct ApiDoc;

/// GET api/doc/api.json
///
/// The OpenAPI document with every payload schema of the console api
pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let doc = Arc::new(ApiDoc::openapi());
    warp::get()
        .and(warp::path!("api" / "doc" / "api.json"))
        .map(move || warp::reply::json(doc.as_ref()))
        .boxed()
}
