//! Nested farm → plot → valve/sensor view derived from the flat collections.
//!
//! Children referencing a missing parent are dropped silently, ordering
//! follows the source collections.

use crate::device::{Node, Valve};
use crate::farm::{Farm, Plot};
use crate::sensor::Sensor;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotView {
    #[serde(flatten)]
    pub plot: Plot,
    pub valves: Vec<Valve>,
    pub sensors: Vec<Sensor>,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmView {
    #[serde(flatten)]
    pub farm: Farm,
    #[serde(rename = "lotes")]
    pub plots: Vec<PlotView>,
}

impl FarmView {
    pub fn plot_count(&self) -> usize {
        self.plots.len()
    }
}

pub fn build_hierarchy(
    farms: &[Farm],
    plots: &[Plot],
    valves: &[Valve],
    sensors: &[Sensor],
    nodes: &[Node],
) -> Vec<FarmView> {
    farms
        .iter()
        .map(|farm| FarmView {
            farm: farm.clone(),
            plots: plots
                .iter()
                .filter(|plot| plot.farm_id == farm.id)
                .map(|plot| build_plot(plot, valves, sensors, nodes))
                .collect(),
        })
        .collect()
}

fn build_plot(plot: &Plot, valves: &[Valve], sensors: &[Sensor], nodes: &[Node]) -> PlotView {
    PlotView {
        plot: plot.clone(),
        valves: valves
            .iter()
            .filter(|v| v.plot_id == plot.id)
            .cloned()
            .collect(),
        sensors: sensors
            .iter()
            .filter(|s| s.plot_id == plot.id)
            .cloned()
            .collect(),
        nodes: nodes
            .iter()
            .filter(|n| n.plot_id == plot.id)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::NewValve;
    use crate::entity::Draft;
    use crate::farm::{NewFarm, NewPlot};
    use crate::sensor::{NewSensor, SensorCategory, SensorStatus, SensorType};
    use chrono::Utc;

    fn farm(id: i32) -> Farm {
        NewFarm {
            name: format!("Finca {}", id),
            ..Default::default()
        }
        .build(id, Utc::now())
    }

    fn plot(id: i32, farm_id: i32) -> Plot {
        NewPlot {
            farm_id,
            name: format!("Lote {}", id),
            ..Default::default()
        }
        .build(id, Utc::now())
    }

    fn valve(id: i32, plot_id: i32) -> Valve {
        NewValve {
            farm_id: 0,
            plot_id,
            name: format!("Válvula {}", id),
            ..Default::default()
        }
        .build(id, Utc::now())
    }

    fn sensor(id: i32, plot_id: i32) -> Sensor {
        NewSensor {
            plot_id,
            name: format!("Sensor {}", id),
            sensor_type: SensorType::Humidity,
            category: SensorCategory::Soil,
            value: 70.0,
            unit: "%".to_owned(),
            status: SensorStatus::Online,
            node_id: None,
            valve_id: None,
            battery_level: 90.0,
            location: String::new(),
        }
        .build(id, Utc::now())
    }

    #[test]
    fn test_empty_collections() {
        assert!(build_hierarchy(&[], &[], &[], &[], &[]).is_empty());

        let views = build_hierarchy(&[farm(1), farm(2)], &[], &[], &[], &[]);
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.plots.is_empty()));
    }

    #[test]
    fn test_children_grouped_by_parent() {
        let farms = vec![farm(1), farm(2)];
        let plots = vec![plot(10, 1), plot(11, 2), plot(12, 1)];
        let valves = vec![valve(20, 10), valve(21, 12), valve(22, 10)];
        let sensors = vec![sensor(30, 11), sensor(31, 10)];

        let views = build_hierarchy(&farms, &plots, &valves, &sensors, &[]);

        let first: Vec<i32> = views[0].plots.iter().map(|p| p.plot.id).collect();
        assert_eq!(first, vec![10, 12]);
        assert_eq!(views[1].plot_count(), 1);

        let lot_10 = &views[0].plots[0];
        let valve_ids: Vec<i32> = lot_10.valves.iter().map(|v| v.id).collect();
        assert_eq!(valve_ids, vec![20, 22]);
        assert_eq!(lot_10.sensors.len(), 1);
        assert_eq!(views[1].plots[0].sensors[0].id, 30);
    }

    #[test]
    fn test_dangling_children_are_dropped() {
        let farms = vec![farm(1)];
        let plots = vec![plot(10, 1), plot(11, 99)];
        let valves = vec![valve(20, 77)];
        let sensors = vec![sensor(30, 11)];

        let views = build_hierarchy(&farms, &plots, &valves, &sensors, &[]);

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].plots.len(), 1);
        assert!(views[0].plots[0].valves.is_empty());
        assert!(views[0].plots[0].sensors.is_empty());
    }

    #[test]
    fn test_nested_wire_shape() {
        let views = build_hierarchy(&[farm(1)], &[plot(10, 1)], &[], &[], &[]);
        let json = serde_json::to_value(&views).unwrap();

        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["lotes"][0]["fincaId"], 1);
        assert!(json[0]["lotes"][0]["valves"].as_array().unwrap().is_empty());
    }
}
