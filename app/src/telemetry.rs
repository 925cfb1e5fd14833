//! Interval-driven randomization keeping the dashboard values fresh.
//!
//! Sensor values jitter by up to ±1, flows of active valves by ±1.5 and both
//! never drop below zero. Inactive valves are forced to zero flow. Ticks are
//! skipped while the console page is hidden.

use crate::store::ConsoleStore;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riego_core::{Sensor, SystemStatus, Valve};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub const SENSOR_JITTER: f64 = 1.0;
pub const FLOW_JITTER: f64 = 1.5;
const CONNECTIVITY_STEP: f64 = 2.0;
const CONNECTIVITY_MIN: f64 = 90.0;
const CONNECTIVITY_MAX: f64 = 100.0;

pub fn jitter_sensor<R: Rng>(rng: &mut R, sensor: &mut Sensor, now: DateTime<Utc>) {
    let delta = rng.gen_range(-SENSOR_JITTER..=SENSOR_JITTER);
    sensor.value = (sensor.value + delta).max(0.0);
    sensor.last_reading = now;
}

pub fn jitter_valve<R: Rng>(rng: &mut R, valve: &mut Valve) {
    if valve.is_active() {
        let delta = rng.gen_range(-FLOW_JITTER..=FLOW_JITTER);
        valve.flow_rate = (valve.flow_rate + delta).max(0.0);
    } else {
        valve.flow_rate = 0.0;
    }
}

pub fn walk_connectivity<R: Rng>(rng: &mut R, current: f64) -> f64 {
    let delta = rng.gen_range(-CONNECTIVITY_STEP..=CONNECTIVITY_STEP);
    (current + delta).clamp(CONNECTIVITY_MIN, CONNECTIVITY_MAX)
}

pub fn summarize(
    sensors: &[Sensor],
    valves: &[Valve],
    connectivity: f64,
    now: DateTime<Utc>,
) -> SystemStatus {
    SystemStatus {
        last_update: now,
        connectivity,
        online_sensors: sensors.iter().filter(|s| s.is_online()).count(),
        total_sensors: sensors.len(),
        active_valves: valves.iter().filter(|v| v.is_active()).count(),
        total_valves: valves.len(),
    }
}

/// Ticks every `period` until `shutdown` flips to true. The first tick
/// fires one period after the start.
pub async fn dispatch_telemetry_loop(
    store: Arc<ConsoleStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), "Start simulating telemetry");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !store.is_visible() {
                    debug!("Page hidden, skipping telemetry tick");
                    continue;
                }
                let status = store.refresh_telemetry(&mut rng);
                debug!(
                    connectivity = status.connectivity,
                    active_valves = status.active_valves,
                    "Telemetry refreshed"
                );
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("Stopped simulating telemetry");
}
