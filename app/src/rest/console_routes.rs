use super::{build_response, Context};
use crate::backend::BackendClient;
use crate::error::{ApiError, ConsoleError, StoreError};
use crate::store::ConsoleStore;
use riego_core::{Plot, Sensor};
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    ctx: &Context,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    toggle_valve(ctx.store.clone())
        .or(provision_plot(ctx.store.clone()))
        .or(sensor_history(ctx.store.clone(), ctx.backend.clone()))
        .or(hierarchy(ctx.store.clone()))
        .or(system_status(ctx.store.clone()))
        .or(suggestions(ctx.store.clone()))
        .or(derive_suggestions(ctx.store.clone()))
        .or(apply_suggestion(ctx.store.clone()))
        .or(dismiss_suggestion(ctx.store.clone()))
        .or(notifications(ctx.store.clone()))
        .or(read_notification(ctx.store.clone()))
        .or(read_all_notifications(ctx.store.clone()))
}

fn not_found(kind: &'static str, id: i32) -> ConsoleError {
    StoreError::NotFound(kind, id).into()
}

/// POST api/valves/:id/toggle
///
/// Opens a closed valve with its nominal flow, closes an open one
fn toggle_valve(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "valves" / i32 / "toggle"))
        .and_then(|store: Arc<ConsoleStore>, valve_id: i32| async move {
            let resp = store
                .toggle_valve(valve_id)
                .ok_or_else(|| not_found("valve", valve_id));
            build_response(resp)
        })
        .boxed()
}

/// POST api/plots/:id/provision
///
/// Generates one more sensor set for the given node and/or valve
///
/// Returns the new sensors, 400 if neither `nodeId` nor `valveId` is set
fn provision_plot(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "plots" / i32 / "provision"))
        .and(warp::body::json())
        .and_then(
            |store: Arc<ConsoleStore>, plot_id: i32, body: dto::ProvisionRequestDto| async move {
                build_response(provision(&store, plot_id, body))
            },
        )
        .boxed()
}

fn provision(
    store: &ConsoleStore,
    plot_id: i32,
    body: dto::ProvisionRequestDto,
) -> Result<Vec<Sensor>, ConsoleError> {
    if body.node_id.is_none() && body.valve_id.is_none() {
        return Err(ApiError::ArgumentError("nodeId or valveId required").into());
    }
    store
        .find::<Plot>(plot_id)
        .ok_or_else(|| not_found("plot", plot_id))?;
    Ok(store.provision(plot_id, body.node_id, body.valve_id))
}

/// GET api/sensors/:id/history
///
/// Readings of the sensor as recorded by the backend
fn sensor_history(
    store: Arc<ConsoleStore>,
    backend: Arc<BackendClient>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || (store.clone(), backend.clone()))
        .and(warp::get())
        .and(warp::path!("api" / "sensors" / i32 / "history"))
        .and_then(
            |(store, backend): (Arc<ConsoleStore>, Arc<BackendClient>), sensor_id: i32| async move {
                if store.find::<Sensor>(sensor_id).is_none() {
                    return build_response::<()>(Err(not_found("sensor", sensor_id)));
                }
                match backend.sensor_history(sensor_id).await {
                    Ok(readings) => build_response(Ok(readings)),
                    Err(err) => build_response::<()>(Err(err.into())),
                }
            },
        )
        .boxed()
}

/// GET api/hierarchy
///
/// Farms with their plots, each plot with its valves, sensors and nodes
fn hierarchy(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path!("api" / "hierarchy"))
        .and_then(|store: Arc<ConsoleStore>| async move {
            let views = store.hierarchy();
            build_response(Ok(views.as_slice()))
        })
        .boxed()
}

/// GET api/status
fn system_status(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path!("api" / "status"))
        .and_then(|store: Arc<ConsoleStore>| async move { build_response(Ok(store.status())) })
        .boxed()
}

/// GET api/suggestions
fn suggestions(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path!("api" / "suggestions"))
        .and_then(|store: Arc<ConsoleStore>| async move {
            let pending = store.snapshot::<riego_core::Suggestion>();
            build_response(Ok(pending.as_slice()))
        })
        .boxed()
}

/// POST api/suggestions/derive
///
/// Proposes irrigation for dry plots
///
/// Returns only the newly added suggestions
fn derive_suggestions(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "suggestions" / "derive"))
        .and_then(|store: Arc<ConsoleStore>| async move {
            build_response(Ok(store.derive_suggestions()))
        })
        .boxed()
}

/// POST api/suggestions/:id/apply
///
/// Opens the valves of the suggested plot, they close again after the
/// recommended duration
fn apply_suggestion(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "suggestions" / i32 / "apply"))
        .and_then(|store: Arc<ConsoleStore>, suggestion_id: i32| async move {
            let resp = store
                .apply_suggestion(suggestion_id)
                .map(|application| dto::ApplicationDto {
                    completion_pending: application
                        .completion
                        .as_ref()
                        .map_or(false, |job| job.is_pending()),
                    suggestion: application.suggestion,
                    valves: application.valves,
                })
                .ok_or_else(|| not_found("suggestion", suggestion_id));
            build_response(resp)
        })
        .boxed()
}

/// POST api/suggestions/:id/dismiss
fn dismiss_suggestion(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "suggestions" / i32 / "dismiss"))
        .and_then(|store: Arc<ConsoleStore>, suggestion_id: i32| async move {
            let resp = store
                .dismiss_suggestion(suggestion_id)
                .ok_or_else(|| not_found("suggestion", suggestion_id));
            build_response(resp)
        })
        .boxed()
}

/// GET api/notifications
///
/// Newest first, along with the unread count
fn notifications(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path!("api" / "notifications"))
        .and_then(|store: Arc<ConsoleStore>| async move {
            build_response(Ok(dto::NotificationsDto {
                unread: store.unread_count(),
                items: store.notifications(),
            }))
        })
        .boxed()
}

/// POST api/notifications/:id/read
fn read_notification(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "notifications" / i32 / "read"))
        .and_then(|store: Arc<ConsoleStore>, notification_id: i32| async move {
            let resp = store
                .mark_read(notification_id)
                .ok_or_else(|| not_found("notification", notification_id));
            build_response(resp)
        })
        .boxed()
}

/// POST api/notifications/read
///
/// Returns how many notifications were unread before
fn read_all_notifications(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path!("api" / "notifications" / "read"))
        .and_then(|store: Arc<ConsoleStore>| async move {
            let marked = store.mark_all_read();
            build_response(Ok(dto::MarkedDto { marked }))
        })
        .boxed()
}

pub mod dto {
    use riego_core::{Notification, Suggestion};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProvisionRequestDto {
        pub node_id: Option<i32>,
        pub valve_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ApplicationDto {
        pub suggestion: Suggestion,
        pub valves: Vec<i32>,
        pub completion_pending: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationsDto {
        pub unread: usize,
        pub items: Vec<Notification>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkedDto {
        pub marked: usize,
    }
}
