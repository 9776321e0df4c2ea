#![warn(clippy::pedantic)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use woodsim::{
    Calibration, ChartRenderer, ChartSettings, Clock, EngineError, ErrorStatus, MaterialCatalog,
    MeasurementRequest, Metric, Operation, PlotRequest, PropertyRequest, Tool, Workbench,
};

#[derive(Debug)]
struct SteppingClock(AtomicU64);

impl Clock for SteppingClock {
    fn unix_seconds(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn build_workbench(dir: &Path, clock: Arc<SteppingClock>) -> Workbench {
    let settings = ChartSettings {
        artifact_dir: dir.to_path_buf(),
        width: 400,
        height: 300,
        ..ChartSettings::default()
    };
    Workbench::new(
        Arc::new(MaterialCatalog::builtin()),
        Calibration::default(),
        ChartRenderer::with_clock(settings, clock),
    )
}

/// Read all three tools on one material and turn the readings back into the
/// values a user would type into the calculation table.
fn measured_inputs(workbench: &Workbench, wood: &str) -> PropertyRequest {
    let mut readings = HashMap::new();
    for tool in Tool::ALL {
        let response = workbench
            .get_measurement(&MeasurementRequest {
                wood_type: wood.to_string(),
                tool_id: tool.id().to_string(),
            })
            .expect("catalogued material and known tool");
        assert_eq!(response.tool_id, tool.id());
        assert_eq!(response.wood_type, wood);
        let number: f64 = response
            .measurement
            .trim_end_matches(" kg/m³")
            .trim_end_matches('%')
            .parse()
            .expect("reading starts with a number");
        readings.insert(tool, number);
    }
    PropertyRequest {
        wood_type: wood.to_string(),
        density: Some(json!(readings[&Tool::DensityMeter])),
        porosity: Some(json!(readings[&Tool::PorosityMeter] / 100.0)),
        moisture: Some(json!(readings[&Tool::MoistureMeter] / 100.0)),
    }
}

#[test]
fn measurements_match_catalog() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let workbench = build_workbench(dir.path(), Arc::new(SteppingClock(AtomicU64::new(0))));

    let pine = workbench
        .get_measurement(&MeasurementRequest {
            wood_type: "Pine".to_string(),
            tool_id: "density_meter".to_string(),
        })
        .expect("Pine density");
    assert_eq!(pine.measurement, "500 kg/m³");

    let oak = workbench
        .get_measurement(&MeasurementRequest {
            wood_type: "Oak".to_string(),
            tool_id: "porosity_meter".to_string(),
        })
        .expect("Oak porosity");
    assert_eq!(oak.measurement, "45.0%");
}

#[test]
fn unknown_material_and_tool_are_distinct_errors() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let workbench = build_workbench(dir.path(), Arc::new(SteppingClock(AtomicU64::new(0))));

    let unknown_material = workbench.get_measurement(&MeasurementRequest {
        wood_type: "Walnut".to_string(),
        tool_id: "density_meter".to_string(),
    });
    assert_eq!(
        unknown_material,
        Err(EngineError::UnknownMaterial("Walnut".to_string()))
    );

    let unknown_tool = workbench.get_measurement(&MeasurementRequest {
        wood_type: "Pine".to_string(),
        tool_id: "thermometer".to_string(),
    });
    assert_eq!(
        unknown_tool,
        Err(EngineError::UnknownTool("thermometer".to_string()))
    );
}

#[test]
fn measure_calculate_and_plot_every_material() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let clock = Arc::new(SteppingClock(AtomicU64::new(1_700_000_000)));
    let workbench = build_workbench(dir.path(), clock.clone());

    let mut hardness = Map::new();
    let mut moisture_resistance = Map::new();
    let mut tensile_strength = Map::new();
    let woods: Vec<String> = workbench.catalog().names().map(str::to_string).collect();
    for wood in &woods {
        let request = measured_inputs(&workbench, wood);
        let properties = workbench
            .calculate_properties(&request)
            .expect("measured values are valid");
        assert!(properties.success);

        let profile = workbench.catalog().lookup(wood).expect("catalogued");
        let density = profile.density_kg_per_m3();
        assert!((properties.hardness - density * 15.0_f64.to_radians().cos()).abs() < 1.0e-9);
        assert!((properties.tensile_strength - profile.fiber_length * density).abs() < 1.0e-9);
        assert!(properties.moisture_resistance > 0.0 && properties.moisture_resistance < 100.0);

        hardness.insert(wood.clone(), json!(properties.hardness));
        moisture_resistance.insert(wood.clone(), json!(properties.moisture_resistance));
        tensile_strength.insert(wood.clone(), json!(properties.tensile_strength));
    }

    let hardness_only = workbench
        .update_plot(&PlotRequest {
            hardness: Some(hardness.clone()),
            ..PlotRequest::default()
        })
        .expect("hardness chart renders");
    assert_eq!(
        hardness_only.plot_urls.keys().copied().collect::<Vec<_>>(),
        [Metric::Hardness]
    );

    clock.0.fetch_add(1, Ordering::SeqCst);
    let everything = workbench
        .update_plot(&PlotRequest {
            hardness: Some(hardness),
            moisture_resistance: Some(moisture_resistance),
            tensile_strength: Some(tensile_strength),
        })
        .expect("all charts render");
    assert_eq!(everything.plot_urls.len(), 3);
    for url in everything.plot_urls.values() {
        assert!(url.ends_with("_plot_1700000001.png"), "unexpected url {url}");
    }
    assert_ne!(
        hardness_only.plot_urls[&Metric::Hardness],
        everything.plot_urls[&Metric::Hardness]
    );

    let files = std::fs::read_dir(dir.path())
        .expect("artifact directory exists")
        .count();
    assert_eq!(files, 4);
}

#[test]
fn mdf_reference_values() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let workbench = build_workbench(dir.path(), Arc::new(SteppingClock(AtomicU64::new(0))));
    let reply = workbench.handle(&Operation::Calculate(PropertyRequest {
        wood_type: "MDF".to_string(),
        density: Some(json!(800)),
        porosity: Some(json!(0.55)),
        moisture: Some(json!(0.20)),
    }));

    assert!(reply.is_success());
    assert_eq!(reply.body["success"], Value::Bool(true));
    let number = |key: &str| reply.body[key].as_f64().expect("numeric field");
    assert!((number("hardness") - 800.0 * 15.0_f64.to_radians().cos()).abs() < 1.0e-9);
    assert!((number("moisture_resistance") - 36.0).abs() < 1.0e-9);
    assert!((number("tensile_strength") - 800.0).abs() < 1.0e-9);
}

#[test]
fn rejected_requests_carry_only_an_error() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let workbench = build_workbench(dir.path(), Arc::new(SteppingClock(AtomicU64::new(0))));
    let reply = workbench.handle(&Operation::Calculate(PropertyRequest {
        wood_type: "MDF".to_string(),
        density: Some(json!("abc")),
        porosity: Some(json!(0.55)),
        moisture: Some(json!(0.20)),
    }));

    assert_eq!(reply.failure, Some(ErrorStatus::BadRequest));
    assert_eq!(reply.body, json!({"error": "Invalid input values"}));
}

#[test]
fn concurrent_batches_get_distinct_files() {
    let dir = tempfile::tempdir().expect("temporary directory");
    let workbench = Arc::new(build_workbench(
        dir.path(),
        Arc::new(SteppingClock(AtomicU64::new(1_700_000_000))),
    ));
    let mut results = Map::new();
    results.insert("Pine".to_string(), json!(482.96));
    results.insert("Oak".to_string(), json!(676.15));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let workbench = Arc::clone(&workbench);
            let request = PlotRequest {
                tensile_strength: Some(results.clone()),
                ..PlotRequest::default()
            };
            std::thread::spawn(move || workbench.update_plot(&request).expect("chart renders"))
        })
        .collect();

    let mut urls: Vec<String> = handles
        .into_iter()
        .map(|handle| {
            let mut response = handle.join().expect("render thread completes");
            response
                .plot_urls
                .remove(&Metric::TensileStrength)
                .expect("tensile strength url")
        })
        .collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 4);
}
