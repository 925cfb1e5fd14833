use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use riego_core::{
    NewNotification, SensorCategory, SensorStatus, SensorType, Severity, ValveState,
};

fn build_store() -> Arc<ConsoleStore> {
    ConsoleStore::new(StoreSettings {
        provision_delay: Duration::from_millis(50),
        minute: Duration::from_secs(1),
    })
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

fn add_farm(store: &ConsoleStore, name: &str) -> Farm {
    store
        .add_farm(NewFarm {
            name: name.to_owned(),
            location: "Valle Central".to_owned(),
            area: 20.0,
            ..Default::default()
        })
        .unwrap()
}

fn add_plot(store: &Arc<ConsoleStore>, farm_id: i32, name: &str) -> Plot {
    let (plot, _) = store
        .add_plot(NewPlot {
            farm_id,
            name: name.to_owned(),
            area: 2.5,
            ..Default::default()
        })
        .unwrap();
    plot
}

fn add_valve(store: &Arc<ConsoleStore>, plot_id: i32, name: &str) -> Valve {
    let (valve, _) = store
        .add_valve(NewValve {
            plot_id,
            name: name.to_owned(),
            state: ValveState::Closed,
            nominal_flow: Some(30.0),
            ..Default::default()
        })
        .unwrap();
    valve
}

fn soil_humidity(plot_id: i32, value: f64) -> NewSensor {
    NewSensor {
        plot_id,
        name: "Humedad Suelo".to_owned(),
        sensor_type: SensorType::Humidity,
        category: SensorCategory::Soil,
        value,
        unit: "%".to_owned(),
        status: SensorStatus::Online,
        node_id: None,
        valve_id: None,
        battery_level: 90.0,
        location: String::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_plot_gets_default_node_with_sensors() {
    // prepare
    let store = build_store();
    store.load(vec![NewFarm {
        name: "La Esperanza".to_owned(),
        ..Default::default()
    }
    .build(7, Utc::now())]);

    // execute
    let (plot, job) = store
        .add_plot(NewPlot {
            farm_id: 7,
            name: "Norte".to_owned(),
            ..Default::default()
        })
        .unwrap();
    assert!(job.is_pending());
    assert!(store.snapshot::<Node>().is_empty());
    settle().await;

    // validate
    let nodes = store.snapshot::<Node>();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "Nodo Norte");
    assert_eq!(nodes[0].farm_id, 7);

    let sensors = store.snapshot::<Sensor>();
    assert_eq!(sensors.len(), 5);
    assert!(sensors
        .iter()
        .all(|s| s.plot_id == plot.id && s.node_id == Some(nodes[0].id)));
}

#[tokio::test(start_paused = true)]
async fn test_valve_gets_water_sensors() {
    let store = build_store();
    let farm = add_farm(&store, "El Roble");
    let plot = add_plot(&store, farm.id, "Sur");
    settle().await;

    let valve = add_valve(&store, plot.id, "V-1");
    assert_eq!(valve.farm_id, farm.id);
    settle().await;

    let water: Vec<Sensor> = store
        .snapshot::<Sensor>()
        .iter()
        .filter(|s| s.valve_id == Some(valve.id))
        .cloned()
        .collect();
    assert_eq!(water.len(), 3);
    assert!(water.iter().all(|s| s.category == SensorCategory::Water));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_node_provisioning() {
    let store = build_store();
    let farm = add_farm(&store, "El Roble");
    let plot = add_plot(&store, farm.id, "Sur");
    settle().await;

    let (node, _) = store
        .add_node(NewNode {
            farm_id: 0,
            plot_id: plot.id,
            name: "Nodo Extra".to_owned(),
            ..Default::default()
        })
        .unwrap();
    settle().await;

    let count = store
        .snapshot::<Sensor>()
        .iter()
        .filter(|s| s.node_id == Some(node.id))
        .count();
    assert_eq!(count, 5);
    assert_eq!(node.farm_id, farm.id);
}

#[tokio::test(start_paused = true)]
async fn test_deleting_valve_cancels_provisioning() {
    let store = build_store();
    let farm = add_farm(&store, "El Roble");
    let plot = add_plot(&store, farm.id, "Sur");
    settle().await;
    let before = store.snapshot::<Sensor>().len();

    let (valve, job) = store
        .add_valve(NewValve {
            plot_id: plot.id,
            name: "V-9".to_owned(),
            ..Default::default()
        })
        .unwrap();
    let removed = store.delete_valve(valve.id);
    settle().await;

    assert_eq!(removed.valves, vec![valve.id]);
    assert!(!job.is_pending());
    assert_eq!(store.snapshot::<Sensor>().len(), before);
}

#[tokio::test]
async fn test_regenerating_adds_a_new_batch() {
    let store = build_store();
    let farm = add_farm(&store, "El Roble");
    let (plot, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Este".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let (node, job) = store
        .add_node(NewNode {
            plot_id: plot.id,
            name: "Nodo Este".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();

    assert_eq!(store.provision(plot.id, Some(node.id), None).len(), 5);
    assert_eq!(store.provision(plot.id, Some(node.id), None).len(), 5);
    assert_eq!(store.snapshot::<Sensor>().len(), 10);

    assert!(store.provision(999, Some(node.id), None).is_empty());
    assert!(store.provision(plot.id, Some(999), Some(998)).is_empty());
    assert_eq!(store.snapshot::<Sensor>().len(), 10);
}

#[tokio::test]
async fn test_ids_are_unique() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let mut ids = vec![farm.id];
    for i in 0..10 {
        let (plot, job) = store
            .add_plot(NewPlot {
                farm_id: farm.id,
                name: format!("Lote {}", i),
                ..Default::default()
            })
            .unwrap();
        job.cancel();
        ids.push(plot.id);
    }
    ids.push(add_farm(&store, "B").id);

    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn test_missing_ids_are_noops() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let before = store.snapshot::<Farm>();

    assert!(store
        .update::<Farm>(
            farm.id + 100,
            riego_core::FarmPatch {
                name: Some("X".to_owned()),
                ..Default::default()
            }
        )
        .is_none());
    assert!(store.delete_farm(farm.id + 100).is_empty());
    assert!(!store.delete_sensor(42));
    assert!(store.toggle_valve(42).is_none());
    assert!(store.dismiss_suggestion(42).is_none());
    assert!(store.apply_suggestion(42).is_none());
    assert!(store.mark_read(42).is_none());

    assert_eq!(store.snapshot::<Farm>(), before);
}

#[tokio::test]
async fn test_update_merges_partial_fields() {
    let store = build_store();
    let farm = add_farm(&store, "A");

    let updated = store
        .update::<Farm>(
            farm.id,
            riego_core::FarmPatch {
                area: Some(33.0),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.area, 33.0);
    assert_eq!(updated.name, "A");
    assert_eq!(store.find::<Farm>(farm.id), Some(updated));
}

#[tokio::test]
async fn test_validation_before_store() {
    let store = build_store();

    let blank = store.add_farm(NewFarm::default());
    assert!(matches!(blank, Err(ConsoleError::User(_))));

    let orphan = store.add_plot(NewPlot {
        farm_id: 77,
        name: "Huérfano".to_owned(),
        ..Default::default()
    });
    assert!(orphan.is_err());
    assert!(store.snapshot::<Plot>().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_farm_cascades() {
    // prepare
    let store = build_store();
    let doomed = add_farm(&store, "Doomed");
    let kept = add_farm(&store, "Kept");
    let doomed_plot = add_plot(&store, doomed.id, "D1");
    let kept_plot = add_plot(&store, kept.id, "K1");
    settle().await;
    add_valve(&store, doomed_plot.id, "DV");
    add_valve(&store, kept_plot.id, "KV");
    settle().await;
    store
        .add_suggestion(NewSuggestion {
            plot_id: doomed_plot.id,
            priority: riego_core::Priority::Low,
            reason: "seco".to_owned(),
            recommended_duration: 10,
            estimated_water_usage: 100.0,
        })
        .unwrap();

    // execute
    let removed = store.delete_farm(doomed.id);

    // validate
    assert_eq!(removed.farms, vec![doomed.id]);
    assert_eq!(removed.plots, vec![doomed_plot.id]);
    assert_eq!(removed.valves.len(), 1);
    assert_eq!(removed.nodes.len(), 1);
    assert_eq!(removed.sensors.len(), 8);
    assert_eq!(removed.suggestions.len(), 1);

    assert_eq!(store.snapshot::<Farm>().len(), 1);
    assert!(store.snapshot::<Plot>().iter().all(|p| p.farm_id == kept.id));
    assert!(store.snapshot::<Valve>().iter().all(|v| v.farm_id == kept.id));
    assert!(store
        .snapshot::<Sensor>()
        .iter()
        .all(|s| s.plot_id == kept_plot.id));
    assert_eq!(store.snapshot::<Sensor>().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_delete_plot_cancels_pending_node() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let (plot, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Efímero".to_owned(),
            ..Default::default()
        })
        .unwrap();

    let removed = store.delete_plot(plot.id);
    settle().await;

    assert_eq!(removed.plots, vec![plot.id]);
    assert!(!job.is_pending());
    assert!(store.snapshot::<Node>().is_empty());
    assert!(store.snapshot::<Sensor>().is_empty());
    assert_eq!(store.snapshot::<Farm>().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_node_removes_its_sensors_only() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    settle().await;
    let valve = add_valve(&store, plot.id, "V");
    settle().await;
    let node = store.snapshot::<Node>()[0].clone();

    let removed = store.delete_node(node.id);

    assert_eq!(removed.sensors.len(), 5);
    let left = store.snapshot::<Sensor>();
    assert_eq!(left.len(), 3);
    assert!(left.iter().all(|s| s.valve_id == Some(valve.id)));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_twice_restores_valve() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    let valve = add_valve(&store, plot.id, "V");

    let opened = store.toggle_valve(valve.id).unwrap();
    assert_eq!(opened.state, ValveState::Open);
    assert_eq!(opened.flow_rate, 30.0);
    assert!(opened.last_activity.is_some());

    let closed = store.toggle_valve(valve.id).unwrap();
    assert_eq!(closed.state, valve.state);
    assert_eq!(closed.flow_rate, valve.flow_rate);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_twice_after_telemetry_keeps_flow() {
    // prepare
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    let valve = add_valve(&store, plot.id, "V");
    settle().await;
    store.toggle_valve(valve.id);
    store.refresh_telemetry(&mut StdRng::seed_from_u64(3));
    let before = store.find::<Valve>(valve.id).unwrap();
    assert_eq!(before.state, ValveState::Open);

    // execute
    store.toggle_valve(valve.id);
    let after = store.toggle_valve(valve.id).unwrap();

    // validate
    assert_eq!(after.state, before.state);
    assert_eq!(after.flow_rate, before.flow_rate);
}

#[tokio::test]
async fn test_provision_skips_devices_of_other_plots() {
    // prepare
    let store = build_store();
    let farm = add_farm(&store, "A");
    let (north, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Norte".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let (south, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Sur".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let (foreign_valve, job) = store
        .add_valve(NewValve {
            plot_id: south.id,
            name: "V-Sur".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let (foreign_node, job) = store
        .add_node(NewNode {
            plot_id: south.id,
            name: "Nodo Sur".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();

    // execute
    let made = store.provision(north.id, Some(foreign_node.id), Some(foreign_valve.id));

    // validate
    assert!(made.is_empty());
    assert!(store.snapshot::<Sensor>().is_empty());
    assert_eq!(store.provision(south.id, None, Some(foreign_valve.id)).len(), 3);
}

#[tokio::test]
async fn test_load_with_max_id() {
    let store = build_store();
    store.load(vec![NewFarm {
        name: "Límite".to_owned(),
        ..Default::default()
    }
    .build(i32::MAX, Utc::now())]);

    assert_eq!(store.find::<Farm>(i32::MAX).unwrap().name, "Límite");
}

#[tokio::test(start_paused = true)]
async fn test_hierarchy_is_cached_until_mutation() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let empty = add_farm(&store, "Vacía");
    let plot = add_plot(&store, farm.id, "P");
    settle().await;

    let first = store.hierarchy();
    let second = store.hierarchy();
    assert!(Arc::ptr_eq(&first, &second));

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].plots[0].plot.id, plot.id);
    assert_eq!(first[0].plots[0].sensors.len(), 5);
    assert_eq!(first[0].plots[0].nodes.len(), 1);
    assert_eq!(first[1].farm.id, empty.id);
    assert!(first[1].plots.is_empty());

    store.delete_plot(plot.id);
    let third = store.hierarchy();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third[0].plots.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_apply_suggestion_runs_irrigation() {
    // prepare
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    let first = add_valve(&store, plot.id, "V1");
    let second = add_valve(&store, plot.id, "V2");
    settle().await;
    let suggestion = store
        .add_suggestion(NewSuggestion {
            plot_id: plot.id,
            priority: riego_core::Priority::High,
            reason: "Humedad baja".to_owned(),
            recommended_duration: 5,
            estimated_water_usage: 250.0,
        })
        .unwrap();

    // execute
    let application = store.apply_suggestion(suggestion.id).unwrap();

    // validate
    assert_eq!(application.valves, vec![first.id, second.id]);
    assert!(store.snapshot::<Suggestion>().is_empty());
    for id in application.valves.iter() {
        let valve = store.find::<Valve>(*id).unwrap();
        assert!(valve.is_active());
        assert_eq!(valve.flow_rate, riego_core::DEFAULT_FLOW);
    }
    let notes = store.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Success);

    tokio::time::sleep(Duration::from_secs(6)).await;
    for id in application.valves.iter() {
        let valve = store.find::<Valve>(*id).unwrap();
        assert!(!valve.is_active());
        assert_eq!(valve.flow_rate, 0.0);
    }
    let notes = store.notifications();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Riego completado");
    assert!(!application.completion.unwrap().is_pending());
}

#[tokio::test]
async fn test_apply_suggestion_without_valves() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let (plot, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Seco".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let suggestion = store
        .add_suggestion(NewSuggestion {
            plot_id: plot.id,
            priority: riego_core::Priority::Medium,
            reason: "Humedad baja".to_owned(),
            recommended_duration: 15,
            estimated_water_usage: 0.0,
        })
        .unwrap();

    let application = store.apply_suggestion(suggestion.id).unwrap();

    assert!(application.valves.is_empty());
    assert!(application.completion.is_none());
    assert!(store.snapshot::<Suggestion>().is_empty());
    assert!(store.notifications().is_empty());
}

#[tokio::test]
async fn test_dismiss_leaves_valves_alone() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    let valve = add_valve(&store, plot.id, "V");
    let suggestion = store
        .add_suggestion(NewSuggestion {
            plot_id: plot.id,
            priority: riego_core::Priority::Low,
            reason: "Opcional".to_owned(),
            recommended_duration: 10,
            estimated_water_usage: 250.0,
        })
        .unwrap();

    assert_eq!(store.dismiss_suggestion(suggestion.id), Some(suggestion));
    assert!(store.snapshot::<Suggestion>().is_empty());
    assert_eq!(store.find::<Valve>(valve.id).unwrap().state, ValveState::Closed);
    store.shutdown();
}

#[tokio::test]
async fn test_derive_suggestions_for_dry_plots() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let (dry, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Seco".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    let (wet, job) = store
        .add_plot(NewPlot {
            farm_id: farm.id,
            name: "Húmedo".to_owned(),
            ..Default::default()
        })
        .unwrap();
    job.cancel();
    store.add_sensor(soil_humidity(dry.id, 40.0)).unwrap();
    store.add_sensor(soil_humidity(dry.id, 44.0)).unwrap();
    store.add_sensor(soil_humidity(wet.id, 75.0)).unwrap();

    let derived = store.derive_suggestions();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].plot_id, dry.id);
    assert_eq!(derived[0].priority, riego_core::Priority::High);

    assert!(store.derive_suggestions().is_empty());
}

#[tokio::test]
async fn test_notifications_read_flags() {
    let store = build_store();
    let first = store.notify(NewNotification::new(
        Severity::Info,
        "Uno",
        "primero".to_owned(),
    ));
    store.notify(NewNotification::new(
        Severity::Warning,
        "Dos",
        "segundo".to_owned(),
    ));
    assert_eq!(store.unread_count(), 2);

    let read = store.mark_read(first.id).unwrap();
    assert!(read.read);
    assert_eq!(store.unread_count(), 1);

    let listed = store.notifications();
    assert_eq!(listed[0].title, "Dos");
    assert!(!listed[0].read);

    assert_eq!(store.mark_all_read(), 1);
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_load_keeps_ids_fresh() {
    let store = build_store();
    store.load(vec![NewFarm {
        name: "Remota".to_owned(),
        ..Default::default()
    }
    .build(40, Utc::now())]);

    let local = add_farm(&store, "Local");
    assert!(local.id > 40);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_telemetry_updates_status() {
    let store = build_store();
    let farm = add_farm(&store, "A");
    let plot = add_plot(&store, farm.id, "P");
    let valve = add_valve(&store, plot.id, "V");
    settle().await;
    store.toggle_valve(valve.id);
    let version = store.version();

    let mut rng = StdRng::seed_from_u64(21);
    let status = store.refresh_telemetry(&mut rng);

    assert!(store.version() > version);
    assert_eq!(status.total_sensors, 8);
    assert_eq!(status.online_sensors, 8);
    assert_eq!(status.active_valves, 1);
    assert!((90.0..=100.0).contains(&status.connectivity));
    assert!(store.snapshot::<Sensor>().iter().all(|s| s.value >= 0.0));
    assert_eq!(store.status(), status);
}
