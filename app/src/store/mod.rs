//! Source of truth for every entity kind of the console.
//!
//! The store keeps flat collections behind one lock and derives the nested
//! farm hierarchy on demand. Plot, valve and node creation schedule their
//! sensor provisioning as deferred jobs, so the new record is visible to
//! readers before the generated sensors show up.

use crate::error::ConsoleError;
use crate::provisioning;
use crate::scheduler::{TaskHandle, TaskOwner, TaskScheduler};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use riego_core::error::ModelError;
use riego_core::{
    build_hierarchy, Draft, Entity, Farm, FarmView, NewFarm, NewNode, NewPlot, NewSchedule,
    NewSensor, NewSuggestion, NewUser, NewValve, Node, Notification, Plot, Schedule, Sensor,
    Suggestion, SystemStatus, User, Valve,
};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

mod collection;
mod notification;
mod suggestion;
#[cfg(test)]
mod test;

pub use collection::Collection;

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Delay of the provisioning job after a plot, valve or node got created
    pub provision_delay: Duration,
    /// Wall time of one suggestion minute
    pub minute: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            provision_delay: Duration::from_millis(50),
            minute: Duration::from_secs(60),
        }
    }
}

#[derive(Default)]
pub struct Collections {
    pub(crate) users: Collection<User>,
    pub(crate) farms: Collection<Farm>,
    pub(crate) plots: Collection<Plot>,
    pub(crate) valves: Collection<Valve>,
    pub(crate) sensors: Collection<Sensor>,
    pub(crate) nodes: Collection<Node>,
    pub(crate) schedules: Collection<Schedule>,
    pub(crate) suggestions: Collection<Suggestion>,
    pub(crate) notifications: Collection<Notification>,
    pub(crate) status: SystemStatus,
}

/// Entity kinds owning a collection in [`Collections`]
pub trait Stored: Entity {
    fn collection(c: &Collections) -> &Collection<Self>;
    fn collection_mut(c: &mut Collections) -> &mut Collection<Self>;
}

macro_rules! stored {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Stored for $ty {
                fn collection(c: &Collections) -> &Collection<Self> {
                    &c.$field
                }

                fn collection_mut(c: &mut Collections) -> &mut Collection<Self> {
                    &mut c.$field
                }
            }
        )*
    };
}

stored!(
    User => users,
    Farm => farms,
    Plot => plots,
    Valve => valves,
    Sensor => sensors,
    Node => nodes,
    Schedule => schedules,
    Suggestion => suggestions,
    Notification => notifications,
);

/// Records dropped by a cascading delete
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Removed {
    pub farms: Vec<i32>,
    pub plots: Vec<i32>,
    pub valves: Vec<i32>,
    pub nodes: Vec<i32>,
    pub sensors: Vec<i32>,
    pub schedules: Vec<i32>,
    pub suggestions: Vec<i32>,
}

impl Removed {
    pub fn is_empty(&self) -> bool {
        self.farms.is_empty()
            && self.plots.is_empty()
            && self.valves.is_empty()
            && self.nodes.is_empty()
            && self.sensors.is_empty()
            && self.schedules.is_empty()
            && self.suggestions.is_empty()
    }
}

fn ids<T: Entity>(items: Vec<T>) -> Vec<i32> {
    items.iter().map(Entity::id).collect()
}

pub struct ConsoleStore {
    state: RwLock<Collections>,
    ids: AtomicI32,
    version: AtomicU64,
    hierarchy: Mutex<Option<(u64, Arc<Vec<FarmView>>)>>,
    visible: AtomicBool,
    scheduler: TaskScheduler,
    settings: StoreSettings,
}

impl std::fmt::Debug for ConsoleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleStore")
            .field("version", &self.version())
            .finish()
    }
}

impl ConsoleStore {
    pub fn new(settings: StoreSettings) -> Arc<Self> {
        Arc::new(ConsoleStore {
            state: RwLock::new(Collections::default()),
            ids: AtomicI32::new(1),
            version: AtomicU64::new(0),
            hierarchy: Mutex::new(None),
            visible: AtomicBool::new(true),
            scheduler: TaskScheduler::new(),
            settings,
        })
    }

    /// Mutation counter, bumped by every mutator call
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        debug!(visible = visible, "Page visibility changed");
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Cancels every pending deferred job
    pub fn shutdown(&self) {
        let cancelled = self.scheduler.cancel_all();
        info!("Cancelled {} pending jobs", cancelled);
    }

    /*
     * Generic access
     */

    pub fn snapshot<T: Stored>(&self) -> Arc<Vec<T>> {
        T::collection(&self.state.read()).snapshot()
    }

    pub fn find<T: Stored>(&self, id: i32) -> Option<T> {
        T::collection(&self.state.read()).get(id).cloned()
    }

    /// Partial merge into the record with `id`, `None` if it does not exist
    pub fn update<T: Stored>(&self, id: i32, patch: T::Patch) -> Option<T> {
        let updated = self.write(|c| T::collection_mut(c).update(id, patch));
        if updated.is_some() {
            debug!(id = id, kind = T::KIND, "Updated record");
        }
        updated
    }

    /// Replaces a whole collection, e.g. with records fetched from the
    /// backend. Fresh ids continue above the loaded ones.
    pub fn load<T: Stored>(&self, items: Vec<T>) {
        let count = items.len();
        let max_id = items.iter().map(Entity::id).max().unwrap_or(0);
        self.write(|c| T::collection_mut(c).replace(items));
        self.ids.fetch_max(max_id.saturating_add(1), Ordering::SeqCst);
        info!(kind = T::KIND, "Loaded {} records", count);
    }

    fn remove<T: Stored>(&self, id: i32) -> bool {
        let removed = self.write(|c| T::collection_mut(c).remove(id));
        if removed.is_some() {
            info!(id = id, kind = T::KIND, "Deleted record");
        }
        removed.is_some()
    }

    fn next_id(&self) -> i32 {
        self.ids.fetch_add(1, Ordering::SeqCst)
    }

    fn write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Collections) -> R,
    {
        let mut state = self.state.write();
        let ret = f(&mut state);
        self.version.fetch_add(1, Ordering::SeqCst);
        ret
    }

    fn insert<D>(&self, draft: D) -> Result<D::Entity, ConsoleError>
    where
        D: Draft,
        D::Entity: Stored,
    {
        draft.validate()?;
        let entity = draft.build(self.next_id(), Utc::now());
        self.write(|c| <D::Entity as Stored>::collection_mut(c).push(entity.clone()));
        info!(
            id = entity.id(),
            kind = <D::Entity as Entity>::KIND,
            "Created record"
        );
        Ok(entity)
    }

    fn require<T: Stored>(&self, field: &'static str, id: i32) -> Result<T, ModelError> {
        self.find::<T>(id)
            .ok_or(ModelError::UnknownParent(field, id))
    }

    /*
     * Create
     */

    pub fn add_user(&self, draft: NewUser) -> Result<User, ConsoleError> {
        self.insert(draft)
    }

    pub fn add_farm(&self, draft: NewFarm) -> Result<Farm, ConsoleError> {
        self.insert(draft)
    }

    /// Creates the plot and schedules its default node with the node's
    /// sensor set
    pub fn add_plot(self: &Arc<Self>, draft: NewPlot) -> Result<(Plot, TaskHandle), ConsoleError> {
        draft.validate()?;
        self.require::<Farm>("fincaId", draft.farm_id)?;
        let plot = self.insert(draft)?;

        let store = self.clone();
        let plot_id = plot.id;
        let handle = self.scheduler.schedule(
            TaskOwner::Plot(plot_id),
            self.settings.provision_delay,
            move || {
                store.provision_default_node(plot_id);
            },
        );
        Ok((plot, handle))
    }

    /// Creates the valve and schedules its water sensor set
    pub fn add_valve(
        self: &Arc<Self>,
        mut draft: NewValve,
    ) -> Result<(Valve, TaskHandle), ConsoleError> {
        draft.validate()?;
        let plot = self.require::<Plot>("loteId", draft.plot_id)?;
        draft.farm_id = plot.farm_id;
        let valve = self.insert(draft)?;

        let store = self.clone();
        let (plot_id, valve_id) = (valve.plot_id, valve.id);
        let handle = self.scheduler.schedule(
            TaskOwner::Valve(valve_id),
            self.settings.provision_delay,
            move || {
                store.provision(plot_id, None, Some(valve_id));
            },
        );
        Ok((valve, handle))
    }

    /// Creates the node and schedules its soil and air sensor set
    pub fn add_node(self: &Arc<Self>, mut draft: NewNode) -> Result<(Node, TaskHandle), ConsoleError> {
        draft.validate()?;
        let plot = self.require::<Plot>("loteId", draft.plot_id)?;
        draft.farm_id = plot.farm_id;
        let node = self.insert(draft)?;

        let store = self.clone();
        let (plot_id, node_id) = (node.plot_id, node.id);
        let handle = self.scheduler.schedule(
            TaskOwner::Node(node_id),
            self.settings.provision_delay,
            move || {
                store.provision(plot_id, Some(node_id), None);
            },
        );
        Ok((node, handle))
    }

    pub fn add_sensor(&self, draft: NewSensor) -> Result<Sensor, ConsoleError> {
        draft.validate()?;
        self.require::<Plot>("loteId", draft.plot_id)?;
        if let Some(node_id) = draft.node_id {
            self.require::<Node>("nodeId", node_id)?;
        }
        if let Some(valve_id) = draft.valve_id {
            self.require::<Valve>("valveId", valve_id)?;
        }
        self.insert(draft)
    }

    pub fn add_schedule(&self, draft: NewSchedule) -> Result<Schedule, ConsoleError> {
        draft.validate()?;
        self.require::<Plot>("loteId", draft.plot_id)?;
        self.require::<Valve>("valveId", draft.valve_id)?;
        self.insert(draft)
    }

    pub fn add_suggestion(&self, draft: NewSuggestion) -> Result<Suggestion, ConsoleError> {
        draft.validate()?;
        self.require::<Plot>("loteId", draft.plot_id)?;
        self.insert(draft)
    }

    /*
     * Provisioning
     */

    /// Appends one sensor batch for the given node and/or valve of a plot.
    /// Unknown ids and devices of other plots are skipped, an unknown plot
    /// yields nothing.
    pub fn provision(&self, plot_id: i32, node_id: Option<i32>, valve_id: Option<i32>) -> Vec<Sensor> {
        let now = Utc::now();
        let sensors = self.write(|c| {
            let drafts = provisioning::provision_sensors(
                &mut rand::thread_rng(),
                c.plots.get(plot_id),
                node_id
                    .and_then(|id| c.nodes.get(id))
                    .filter(|n| n.plot_id == plot_id),
                valve_id
                    .and_then(|id| c.valves.get(id))
                    .filter(|v| v.plot_id == plot_id),
            );
            let sensors: Vec<Sensor> = drafts
                .into_iter()
                .map(|draft| draft.build(self.next_id(), now))
                .collect();
            c.sensors.extend(sensors.clone());
            sensors
        });

        if sensors.is_empty() {
            debug!(plot_id = plot_id, "Nothing to provision");
        } else {
            info!(plot_id = plot_id, "Provisioned {} sensors", sensors.len());
        }
        sensors
    }

    /// Creates `Nodo <plot name>` with its sensor set, a no-op once the
    /// plot is gone
    pub fn provision_default_node(&self, plot_id: i32) -> Option<(Node, Vec<Sensor>)> {
        let plot = self.find::<Plot>(plot_id)?;
        let node = self
            .insert(NewNode {
                farm_id: plot.farm_id,
                plot_id,
                name: format!("Nodo {}", plot.name),
                coordinates: plot.center,
                ..Default::default()
            })
            .ok()?;
        let sensors = self.provision(plot_id, Some(node.id), None);
        Some((node, sensors))
    }

    /*
     * Delete
     */

    pub fn delete_user(&self, id: i32) -> bool {
        self.remove::<User>(id)
    }

    pub fn delete_sensor(&self, id: i32) -> bool {
        self.remove::<Sensor>(id)
    }

    pub fn delete_schedule(&self, id: i32) -> bool {
        self.remove::<Schedule>(id)
    }

    /// Drops the farm with everything that belongs to it or its plots
    pub fn delete_farm(&self, id: i32) -> Removed {
        let removed = self.write(|c| {
            let mut removed = Removed::default();
            if c.farms.remove(id).is_none() {
                return removed;
            }
            removed.farms.push(id);
            removed.plots = ids(c.plots.remove_where(|p| p.farm_id == id));
            removed.valves = ids(c.valves.remove_where(|v| v.farm_id == id));
            removed.nodes = ids(c.nodes.remove_where(|n| n.farm_id == id));
            purge_plot_children(c, &mut removed);
            removed
        });
        self.cancel_jobs(&removed);
        removed
    }

    /// Drops the plot with its valves, nodes, sensors, schedules and
    /// suggestions
    pub fn delete_plot(&self, id: i32) -> Removed {
        let removed = self.write(|c| {
            let mut removed = Removed::default();
            if c.plots.remove(id).is_none() {
                return removed;
            }
            removed.plots.push(id);
            purge_plot_children(c, &mut removed);
            removed
        });
        self.cancel_jobs(&removed);
        removed
    }

    /// Drops the valve with its water sensors and schedules
    pub fn delete_valve(&self, id: i32) -> Removed {
        let removed = self.write(|c| {
            let mut removed = Removed::default();
            if c.valves.remove(id).is_none() {
                return removed;
            }
            removed.valves.push(id);
            removed.sensors = ids(c.sensors.remove_where(|s| s.valve_id == Some(id)));
            removed.schedules = ids(c.schedules.remove_where(|s| s.valve_id == id));
            removed
        });
        self.cancel_jobs(&removed);
        removed
    }

    /// Drops the node with the sensors it carries
    pub fn delete_node(&self, id: i32) -> Removed {
        let removed = self.write(|c| {
            let mut removed = Removed::default();
            if c.nodes.remove(id).is_none() {
                return removed;
            }
            removed.nodes.push(id);
            removed.sensors = ids(c.sensors.remove_where(|s| s.node_id == Some(id)));
            removed
        });
        self.cancel_jobs(&removed);
        removed
    }

    fn cancel_jobs(&self, removed: &Removed) {
        if removed.is_empty() {
            return;
        }
        let owners = removed
            .plots
            .iter()
            .map(|id| TaskOwner::Plot(*id))
            .chain(removed.valves.iter().map(|id| TaskOwner::Valve(*id)))
            .chain(removed.nodes.iter().map(|id| TaskOwner::Node(*id)));
        let cancelled: usize = owners
            .map(|owner| self.scheduler.cancel_owned_by(owner))
            .sum();
        info!(
            "Deleted {} farms, {} plots, {} valves, {} nodes, {} sensors, cancelled {} jobs",
            removed.farms.len(),
            removed.plots.len(),
            removed.valves.len(),
            removed.nodes.len(),
            removed.sensors.len(),
            cancelled
        );
    }

    /*
     * Valves
     */

    pub fn toggle_valve(&self, id: i32) -> Option<Valve> {
        let now = Utc::now();
        let valve = self.write(|c| c.valves.modify(id, |v| v.toggle(now)));
        if let Some(valve) = &valve {
            info!(valve_id = id, state = ?valve.state, "Toggled valve");
        }
        valve
    }

    /*
     * Derived views
     */

    /// Nested farm view, rebuilt only when the store changed since the
    /// last call
    pub fn hierarchy(&self) -> Arc<Vec<FarmView>> {
        let version = self.version();
        let mut cache = self.hierarchy.lock();
        if let Some((cached, views)) = cache.as_ref() {
            if *cached == version {
                return views.clone();
            }
        }

        let views = {
            let c = self.state.read();
            Arc::new(build_hierarchy(
                c.farms.as_slice(),
                c.plots.as_slice(),
                c.valves.as_slice(),
                c.sensors.as_slice(),
                c.nodes.as_slice(),
            ))
        };
        *cache = Some((version, views.clone()));
        views
    }

    pub fn status(&self) -> SystemStatus {
        self.state.read().status.clone()
    }

    /// One telemetry tick over all sensors, valves and schedules
    pub fn refresh_telemetry<R: rand::Rng>(&self, rng: &mut R) -> SystemStatus {
        let now = Utc::now();
        self.write(|c| {
            c.sensors
                .modify_all(|s| crate::telemetry::jitter_sensor(rng, s, now));
            c.valves.modify_all(|v| crate::telemetry::jitter_valve(rng, v));
            c.schedules.modify_all(|s| {
                if s.active {
                    s.advance(now)
                }
            });
            let connectivity = crate::telemetry::walk_connectivity(rng, c.status.connectivity);
            c.status = crate::telemetry::summarize(
                c.sensors.as_slice(),
                c.valves.as_slice(),
                connectivity,
                now,
            );
            c.status.clone()
        })
    }
}

/// Removes everything hanging off the plots, valves and nodes already
/// collected in `removed`
fn purge_plot_children(c: &mut Collections, removed: &mut Removed) {
    let plots = removed.plots.clone();
    let in_plots = |plot_id: i32| plots.contains(&plot_id);

    removed
        .valves
        .extend(ids(c.valves.remove_where(|v| in_plots(v.plot_id))));
    removed
        .nodes
        .extend(ids(c.nodes.remove_where(|n| in_plots(n.plot_id))));

    let valves = removed.valves.clone();
    let nodes = removed.nodes.clone();
    removed.sensors = ids(c.sensors.remove_where(|s| {
        in_plots(s.plot_id)
            || s.valve_id.map_or(false, |id| valves.contains(&id))
            || s.node_id.map_or(false, |id| nodes.contains(&id))
    }));
    removed.schedules = ids(c.schedules.remove_where(|s| {
        in_plots(s.plot_id) || valves.contains(&s.valve_id)
    }));
    removed.suggestions = ids(c.suggestions.remove_where(|s| in_plots(s.plot_id)));
}
