//! Sensor sets generated for a new node (soil + air) or valve (water).

use rand::Rng;
use riego_core::{Node, NewSensor, Plot, SensorCategory, SensorStatus, SensorType, Valve};
use std::ops::RangeInclusive;

struct SensorTemplate {
    label: &'static str,
    sensor_type: SensorType,
    category: SensorCategory,
    range: RangeInclusive<f64>,
    unit: &'static str,
}

const NODE_SENSORS: [SensorTemplate; 5] = [
    SensorTemplate {
        label: "Temperatura Suelo",
        sensor_type: SensorType::Temperature,
        category: SensorCategory::Soil,
        range: 25.0..=30.0,
        unit: "°C",
    },
    SensorTemplate {
        label: "Humedad Suelo",
        sensor_type: SensorType::Humidity,
        category: SensorCategory::Soil,
        range: 60.0..=80.0,
        unit: "%",
    },
    SensorTemplate {
        label: "pH Suelo",
        sensor_type: SensorType::Ph,
        category: SensorCategory::Soil,
        range: 6.0..=8.0,
        unit: "pH",
    },
    SensorTemplate {
        label: "Temperatura Aire",
        sensor_type: SensorType::Temperature,
        category: SensorCategory::Air,
        range: 26.0..=30.0,
        unit: "°C",
    },
    SensorTemplate {
        label: "Humedad Aire",
        sensor_type: SensorType::Humidity,
        category: SensorCategory::Air,
        range: 65.0..=80.0,
        unit: "%",
    },
];

const NODE_BATTERY: RangeInclusive<f64> = 80.0..=100.0;
const VALVE_BATTERY: RangeInclusive<f64> = 75.0..=100.0;
const PRESSURE: RangeInclusive<f64> = 1.5..=2.5;
const WATER_TEMPERATURE: RangeInclusive<f64> = 22.0..=26.0;
const FALLBACK_FLOW: RangeInclusive<f64> = 20.0..=35.0;

/// Sensors for `plot`, one set per given node and valve. Nothing without
/// a plot, the caller resolves ids and passes `None` for missing records.
pub fn provision_sensors<R: Rng>(
    rng: &mut R,
    plot: Option<&Plot>,
    node: Option<&Node>,
    valve: Option<&Valve>,
) -> Vec<NewSensor> {
    let plot = match plot {
        Some(plot) => plot,
        None => return Vec::new(),
    };

    let mut sensors = Vec::new();
    if let Some(node) = node {
        sensors.extend(node_sensors(rng, plot, node));
    }
    if let Some(valve) = valve {
        sensors.extend(valve_sensors(rng, plot, valve));
    }
    sensors
}

fn node_sensors<R: Rng>(rng: &mut R, plot: &Plot, node: &Node) -> Vec<NewSensor> {
    let location = format!("{} - {}", plot.name, node.name);
    NODE_SENSORS
        .iter()
        .map(|template| NewSensor {
            plot_id: plot.id,
            name: format!("{} {}", template.label, node.name),
            sensor_type: template.sensor_type,
            category: template.category,
            value: round(rng.gen_range(template.range.clone())),
            unit: template.unit.to_owned(),
            status: SensorStatus::Online,
            node_id: Some(node.id),
            valve_id: None,
            battery_level: round(rng.gen_range(NODE_BATTERY)),
            location: location.clone(),
        })
        .collect()
}

fn valve_sensors<R: Rng>(rng: &mut R, plot: &Plot, valve: &Valve) -> Vec<NewSensor> {
    let location = format!("{} - {}", plot.name, valve.name);
    let flow = if valve.flow_rate > 0.0 {
        valve.flow_rate
    } else {
        round(rng.gen_range(FALLBACK_FLOW))
    };
    let readings = [
        ("Presión", SensorType::Pressure, round(rng.gen_range(PRESSURE)), "bar"),
        (
            "Temperatura Agua",
            SensorType::Temperature,
            round(rng.gen_range(WATER_TEMPERATURE)),
            "°C",
        ),
        ("Caudal", SensorType::Flow, flow, "L/min"),
    ];

    readings
        .iter()
        .map(|(label, sensor_type, value, unit)| NewSensor {
            plot_id: plot.id,
            name: format!("{} {}", label, valve.name),
            sensor_type: *sensor_type,
            category: SensorCategory::Water,
            value: *value,
            unit: (*unit).to_owned(),
            status: SensorStatus::Online,
            node_id: None,
            valve_id: Some(valve.id),
            battery_level: round(rng.gen_range(VALVE_BATTERY)),
            location: location.clone(),
        })
        .collect()
}

fn round(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
