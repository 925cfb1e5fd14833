use crate::error::ConsoleError;
use crate::store::ConsoleStore;
use chrono::{NaiveDate, NaiveTime};
use riego_core::error::ModelError;
use riego_core::{
    Coordinate, Crop, Frequency, NewFarm, NewNotification, NewPlot, NewSchedule, NewSuggestion,
    NewUser, NewValve, Priority, Role, Severity, ValveState, DEFAULT_FLOW,
};
use std::sync::Arc;
use tracing::info;

struct DemoPlot {
    name: &'static str,
    area: f64,
    crop: &'static str,
    variety: &'static str,
    center: (f64, f64),
    valves: &'static [(&'static str, ValveState, f64)],
}

struct DemoFarm {
    name: &'static str,
    location: &'static str,
    area: f64,
    coordinates: (f64, f64),
    plots: &'static [DemoPlot],
}

const DEMO: [DemoFarm; 2] = [
    DemoFarm {
        name: "Finca La Esperanza",
        location: "Cartago",
        area: 45.0,
        coordinates: (9.8644, -83.9194),
        plots: &[
            DemoPlot {
                name: "Norte",
                area: 12.5,
                crop: "Café",
                variety: "Caturra",
                center: (9.8661, -83.9201),
                valves: &[
                    ("Válvula Norte 1", ValveState::Open, 28.0),
                    ("Válvula Norte 2", ValveState::Closed, 25.0),
                ],
            },
            DemoPlot {
                name: "Sur",
                area: 8.0,
                crop: "Tomate",
                variety: "Cherry",
                center: (9.8627, -83.9188),
                valves: &[("Válvula Sur", ValveState::Closed, 22.0)],
            },
        ],
    },
    DemoFarm {
        name: "Finca El Roble",
        location: "Alajuela",
        area: 30.0,
        coordinates: (10.0163, -84.2116),
        plots: &[DemoPlot {
            name: "Huerta",
            area: 6.5,
            crop: "Lechuga",
            variety: "Romana",
            center: (10.0171, -84.2109),
            valves: &[("Válvula Huerta", ValveState::Partial, 15.0)],
        }],
    },
];

/// Fills an empty store with a small demo installation. Sensors and nodes
/// follow through the regular provisioning jobs.
pub fn seed_demo_data(store: &Arc<ConsoleStore>) -> Result<(), ConsoleError> {
    store.add_user(NewUser {
        name: "Operador Demo".to_owned(),
        email: "demo@riego.local".to_owned(),
        role: Role::Operator,
    })?;

    let planted_at = NaiveDate::from_ymd_opt(2024, 3, 1);
    let mut first_plot = None;
    for demo in DEMO.iter() {
        let farm = store.add_farm(NewFarm {
            name: demo.name.to_owned(),
            location: demo.location.to_owned(),
            area: demo.area,
            coordinates: Coordinate {
                lat: demo.coordinates.0,
                lng: demo.coordinates.1,
            },
            ..Default::default()
        })?;

        for demo_plot in demo.plots.iter() {
            let (plot, _) = store.add_plot(NewPlot {
                farm_id: farm.id,
                name: demo_plot.name.to_owned(),
                area: demo_plot.area,
                crop: Crop {
                    crop_type: demo_plot.crop.to_owned(),
                    variety: Some(demo_plot.variety.to_owned()),
                    planted_at,
                },
                boundary: Vec::new(),
                center: Some(Coordinate {
                    lat: demo_plot.center.0,
                    lng: demo_plot.center.1,
                }),
            })?;

            for (name, state, flow) in demo_plot.valves.iter() {
                let active = matches!(state, ValveState::Open | ValveState::Partial);
                let (valve, _) = store.add_valve(NewValve {
                    plot_id: plot.id,
                    name: (*name).to_owned(),
                    state: *state,
                    flow_rate: if active { *flow } else { 0.0 },
                    nominal_flow: Some(*flow),
                    ..Default::default()
                })?;

                if first_plot.is_none() {
                    store.add_schedule(NewSchedule {
                        name: format!("Riego matutino {}", plot.name),
                        plot_id: plot.id,
                        valve_id: valve.id,
                        start_time: NaiveTime::from_hms_opt(6, 0, 0)
                            .ok_or(ModelError::InvalidValue("startTime", "06:00".to_owned()))?,
                        duration: 30,
                        frequency: Frequency::Daily,
                        active: true,
                    })?;
                    first_plot = Some(plot.clone());
                }
            }
        }
    }

    if let Some(plot) = first_plot {
        store.add_suggestion(NewSuggestion {
            plot_id: plot.id,
            priority: Priority::Medium,
            reason: format!("Humedad del suelo en {} por debajo del 55%", plot.name),
            recommended_duration: 20,
            estimated_water_usage: 20.0 * DEFAULT_FLOW * 2.0,
        })?;
    }

    store.notify(NewNotification::new(
        Severity::Info,
        "Datos de demostración",
        "El servidor no respondió, se cargaron datos locales".to_owned(),
    ));
    info!("Seeded demo data");
    Ok(())
}
