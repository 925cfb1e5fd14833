use super::ConsoleStore;
use crate::scheduler::{TaskHandle, TaskOwner};
use chrono::Utc;
use riego_core::{
    Entity, NewNotification, NewSuggestion, Plot, Priority, Sensor, SensorCategory, SensorType,
    Severity, Suggestion, Valve, DEFAULT_FLOW,
};
use std::sync::Arc;
use tracing::info;

/// Soil humidity (%) below which a plot gets an irrigation suggestion
pub const HUMIDITY_TARGET: f64 = 60.0;
const MIN_DURATION: u32 = 10;

/// Outcome of applying a suggestion
#[derive(Debug)]
pub struct Application {
    pub suggestion: Suggestion,
    pub valves: Vec<i32>,
    /// Pending job closing the valves again, absent if the plot had none
    pub completion: Option<TaskHandle>,
}

impl ConsoleStore {
    /// Opens every valve of the suggestion's plot and schedules closing them
    /// after the recommended duration. The suggestion leaves the pending
    /// list right away, with or without valves.
    pub fn apply_suggestion(self: &Arc<Self>, id: i32) -> Option<Application> {
        let now = Utc::now();
        let (suggestion, valves) = self.write(|c| {
            let suggestion = c.suggestions.remove(id)?;
            let valves: Vec<i32> = c
                .valves
                .iter()
                .filter(|v| v.plot_id == suggestion.plot_id)
                .map(Entity::id)
                .collect();
            for valve_id in valves.iter() {
                c.valves.modify(*valve_id, |v| v.activate(now));
            }
            Some((suggestion, valves))
        })?;

        if valves.is_empty() {
            info!(
                suggestion_id = id,
                plot_id = suggestion.plot_id,
                "Applied suggestion without valves"
            );
            return Some(Application {
                suggestion,
                valves,
                completion: None,
            });
        }

        let plot_name = self
            .find::<Plot>(suggestion.plot_id)
            .map(|p| p.name)
            .unwrap_or_default();
        self.notify(NewNotification::new(
            Severity::Success,
            "Riego iniciado",
            format!(
                "Riego de {} minutos iniciado en {} ({} válvulas)",
                suggestion.recommended_duration,
                plot_name,
                valves.len()
            ),
        ));

        let store = self.clone();
        let job_valves = valves.clone();
        let delay = self.settings.minute * suggestion.recommended_duration;
        let completion = self.scheduler.schedule(
            TaskOwner::Plot(suggestion.plot_id),
            delay,
            move || store.complete_irrigation(&plot_name, &job_valves),
        );

        info!(
            suggestion_id = id,
            plot_id = suggestion.plot_id,
            "Applied suggestion on {} valves",
            valves.len()
        );
        Some(Application {
            suggestion,
            valves,
            completion: Some(completion),
        })
    }

    pub fn dismiss_suggestion(&self, id: i32) -> Option<Suggestion> {
        let suggestion = self.write(|c| c.suggestions.remove(id));
        if suggestion.is_some() {
            info!(suggestion_id = id, "Dismissed suggestion");
        }
        suggestion
    }

    fn complete_irrigation(&self, plot_name: &str, valve_ids: &[i32]) {
        let now = Utc::now();
        let closed = self.write(|c| {
            valve_ids
                .iter()
                .filter_map(|id| c.valves.modify(*id, |v| v.deactivate(now)))
                .count()
        });
        if closed == 0 {
            return;
        }
        self.notify(NewNotification::new(
            Severity::Info,
            "Riego completado",
            format!("Riego finalizado en {} ({} válvulas)", plot_name, closed),
        ));
    }

    /// Proposes irrigation for every plot whose mean soil humidity is below
    /// [`HUMIDITY_TARGET`] and that has no pending suggestion yet
    pub fn derive_suggestions(&self) -> Vec<Suggestion> {
        let plots = self.snapshot::<Plot>();
        let sensors = self.snapshot::<Sensor>();
        let valves = self.snapshot::<Valve>();
        let pending = self.snapshot::<Suggestion>();

        let drafts: Vec<NewSuggestion> = plots
            .iter()
            .filter(|plot| !pending.iter().any(|s| s.plot_id == plot.id))
            .filter_map(|plot| {
                let humidity = soil_humidity(&sensors, plot.id)?;
                if humidity >= HUMIDITY_TARGET {
                    return None;
                }
                let valve_count = valves.iter().filter(|v| v.plot_id == plot.id).count();
                Some(propose(plot, humidity, valve_count))
            })
            .collect();

        drafts
            .into_iter()
            .filter_map(|draft| self.add_suggestion(draft).ok())
            .collect()
    }
}

fn soil_humidity(sensors: &[Sensor], plot_id: i32) -> Option<f64> {
    let readings: Vec<f64> = sensors
        .iter()
        .filter(|s| {
            s.plot_id == plot_id
                && s.category == SensorCategory::Soil
                && s.sensor_type == SensorType::Humidity
        })
        .map(|s| s.value)
        .collect();
    if readings.is_empty() {
        None
    } else {
        Some(readings.iter().sum::<f64>() / readings.len() as f64)
    }
}

fn propose(plot: &Plot, humidity: f64, valve_count: usize) -> NewSuggestion {
    let priority = if humidity < 45.0 {
        Priority::High
    } else if humidity < 55.0 {
        Priority::Medium
    } else {
        Priority::Low
    };
    let duration = (((HUMIDITY_TARGET - humidity) * 2.0).round() as u32).max(MIN_DURATION);
    NewSuggestion {
        plot_id: plot.id,
        priority,
        reason: format!(
            "Humedad del suelo en {} al {:.0}%, por debajo del {:.0}%",
            plot.name, humidity, HUMIDITY_TARGET
        ),
        recommended_duration: duration,
        estimated_water_usage: duration as f64 * DEFAULT_FLOW * valve_count as f64,
    }
}
