//! CRUD endpoints shared by every entity kind, mounted under
//! `/api/<kind>` and `/api/<kind>/:id`.

use super::build_response;
use crate::error::{ConsoleError, StoreError};
use crate::store::{ConsoleStore, Removed, Stored};
use riego_core::{
    Farm, NewFarm, NewNode, NewPlot, NewSchedule, NewSensor, NewUser, NewValve, Node, Plot,
    Schedule, Sensor, User, Valve,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use warp::Filter;

pub trait Resource: Stored + Serialize {
    type Draft: DeserializeOwned + Send + 'static;

    /// Path segment below `/api`
    const PATH: &'static str;

    fn create(store: &Arc<ConsoleStore>, draft: Self::Draft) -> Result<Self, ConsoleError>;

    /// `None` if nothing with `id` exists
    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed>;
}

fn removed_if(found: bool) -> Option<Removed> {
    if found {
        Some(Removed::default())
    } else {
        None
    }
}

fn cascaded(removed: Removed) -> Option<Removed> {
    if removed.is_empty() {
        None
    } else {
        Some(removed)
    }
}

impl Resource for User {
    type Draft = NewUser;
    const PATH: &'static str = "users";

    fn create(store: &Arc<ConsoleStore>, draft: NewUser) -> Result<Self, ConsoleError> {
        store.add_user(draft)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        removed_if(store.delete_user(id))
    }
}

impl Resource for Farm {
    type Draft = NewFarm;
    const PATH: &'static str = "farms";

    fn create(store: &Arc<ConsoleStore>, draft: NewFarm) -> Result<Self, ConsoleError> {
        store.add_farm(draft)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        cascaded(store.delete_farm(id))
    }
}

impl Resource for Plot {
    type Draft = NewPlot;
    const PATH: &'static str = "plots";

    fn create(store: &Arc<ConsoleStore>, draft: NewPlot) -> Result<Self, ConsoleError> {
        store.add_plot(draft).map(|(plot, _)| plot)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        cascaded(store.delete_plot(id))
    }
}

impl Resource for Valve {
    type Draft = NewValve;
    const PATH: &'static str = "valves";

    fn create(store: &Arc<ConsoleStore>, draft: NewValve) -> Result<Self, ConsoleError> {
        store.add_valve(draft).map(|(valve, _)| valve)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        cascaded(store.delete_valve(id))
    }
}

impl Resource for Node {
    type Draft = NewNode;
    const PATH: &'static str = "nodes";

    fn create(store: &Arc<ConsoleStore>, draft: NewNode) -> Result<Self, ConsoleError> {
        store.add_node(draft).map(|(node, _)| node)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        cascaded(store.delete_node(id))
    }
}

impl Resource for Sensor {
    type Draft = NewSensor;
    const PATH: &'static str = "sensors";

    fn create(store: &Arc<ConsoleStore>, draft: NewSensor) -> Result<Self, ConsoleError> {
        store.add_sensor(draft)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        removed_if(store.delete_sensor(id)).map(|mut removed| {
            removed.sensors.push(id);
            removed
        })
    }
}

impl Resource for Schedule {
    type Draft = NewSchedule;
    const PATH: &'static str = "schedules";

    fn create(store: &Arc<ConsoleStore>, draft: NewSchedule) -> Result<Self, ConsoleError> {
        store.add_schedule(draft)
    }

    fn delete(store: &ConsoleStore, id: i32) -> Option<Removed> {
        removed_if(store.delete_schedule(id)).map(|mut removed| {
            removed.schedules.push(id);
            removed
        })
    }
}

pub fn routes(
    store: &Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    resource::<User>(store)
        .or(resource::<Farm>(store))
        .or(resource::<Plot>(store))
        .or(resource::<Valve>(store))
        .or(resource::<Node>(store))
        .or(resource::<Sensor>(store))
        .or(resource::<Schedule>(store))
}

fn resource<R>(
    store: &Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
    R: Resource,
    R::Patch: DeserializeOwned + Send,
{
    list::<R>(store.clone())
        .or(create::<R>(store.clone()))
        .or(get::<R>(store.clone()))
        .or(update::<R>(store.clone()))
        .or(delete::<R>(store.clone()))
}

/// GET api/:kind
///
/// Returns every record of the kind in insertion order
fn list<R: Resource>(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path("api"))
        .and(warp::path(R::PATH))
        .and(warp::path::end())
        .and_then(|store: Arc<ConsoleStore>| async move {
            build_response(Ok(store.snapshot::<R>().to_vec()))
        })
        .boxed()
}

/// POST api/:kind
///
/// Validates the creation payload and returns the stored record with its
/// assigned id
fn create<R: Resource>(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::post())
        .and(warp::path("api"))
        .and(warp::path(R::PATH))
        .and(warp::path::end())
        .and(warp::body::json())
        .and_then(|store: Arc<ConsoleStore>, draft: R::Draft| async move {
            build_response(R::create(&store, draft))
        })
        .boxed()
}

/// GET api/:kind/:id
fn get<R: Resource>(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::get())
        .and(warp::path("api"))
        .and(warp::path(R::PATH))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and_then(|store: Arc<ConsoleStore>, id: i32| async move {
            let resp = store
                .find::<R>(id)
                .ok_or_else(|| ConsoleError::from(StoreError::NotFound(R::KIND, id)));
            build_response(resp)
        })
        .boxed()
}

/// PATCH api/:kind/:id
///
/// Merges the given fields into the record
///
/// Returns 404 if the id is unknown, the store stays untouched then
fn update<R>(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
    R: Resource,
    R::Patch: DeserializeOwned + Send,
{
    warp::any()
        .map(move || store.clone())
        .and(warp::patch())
        .and(warp::path("api"))
        .and(warp::path(R::PATH))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and(warp::body::json())
        .and_then(
            |store: Arc<ConsoleStore>, id: i32, patch: R::Patch| async move {
                let resp = store
                    .update::<R>(id, patch)
                    .ok_or_else(|| ConsoleError::from(StoreError::NotFound(R::KIND, id)));
                build_response(resp)
            },
        )
        .boxed()
}

/// DELETE api/:kind/:id
///
/// Returns the ids of every record removed along with it
fn delete<R: Resource>(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::delete())
        .and(warp::path("api"))
        .and(warp::path(R::PATH))
        .and(warp::path::param::<i32>())
        .and(warp::path::end())
        .and_then(|store: Arc<ConsoleStore>, id: i32| async move {
            let resp = R::delete(&store, id).ok_or_else(|| ConsoleError::from(StoreError::NotFound(R::KIND, id)));
            build_response(resp)
        })
        .boxed()
}
