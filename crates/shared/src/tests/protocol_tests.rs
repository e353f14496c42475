use super::*;
use crate::error::ValidationError;
use serde_json::json;

#[test]
fn tolerant_body_builds_entities_from_defaults() {
    let body = json!({
        "transducers": [
            { "id": "a", "position": ["0", "0", "0"], "target": [0, 0, "1"], "radius": "0.01" },
            { "id": "b", "radius": "not a number" },
        ],
        "simulation_geometry": { "plane": "Y", "cell_size": 0.05 },
    });

    let configuration: Configuration = serde_json::from_value(body).expect("config");
    assert_eq!(configuration.transducers.len(), 2);
    assert_eq!(configuration.transducers[0].target, [0.0, 0.0, 1.0]);
    assert_eq!(configuration.transducers[0].radius, 0.01);
    assert_eq!(configuration.transducers[1].radius, Transducer::default().radius);
    assert_eq!(configuration.simulation_geometry.plane, "Y");
    assert_eq!(configuration.simulation_geometry.cell_size, 0.05);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let configuration = Configuration::from_value(&json!({ "transducers": "oops" }));
    assert!(configuration.transducers.is_empty());
    assert_eq!(configuration.simulation_geometry, SimulationGeometry::default());
}

#[test]
fn serializes_as_structured_packet() {
    let configuration = Configuration {
        transducers: vec![Transducer {
            id: "t1".to_string(),
            ..Transducer::default()
        }],
        simulation_geometry: SimulationGeometry::default(),
    };

    let wire = serde_json::to_value(&configuration).expect("json");
    assert_eq!(wire["transducers"][0]["id"], "t1");
    assert_eq!(wire["transducers"][0]["target"], json!([0.0, 1.0, 0.0]));
    assert_eq!(wire["simulation_geometry"]["plane"], "X");
    assert!(wire["transducers"][0].get("row_id").is_none());

    let packet: ConfigPacket = serde_json::from_value(wire.clone()).expect("packet");
    assert_eq!(Configuration::from(packet), configuration);
    assert_eq!(Configuration::from_value(&wire), configuration);
}

#[test]
fn validation_reports_failing_entity_position() {
    let mut configuration = Configuration {
        transducers: vec![Transducer::default(), Transducer::default()],
        simulation_geometry: SimulationGeometry::default(),
    };
    assert!(configuration.validate().is_ok());

    configuration.transducers[1].id = "second".to_string();
    configuration.transducers[1].output_power = -1.0;
    let err = configuration.validate().expect_err("invalid transducer");
    assert!(matches!(
        err,
        ConfigurationError::TransducerInvalid { index: 1, .. }
    ));
    assert_eq!(err.reason(), ValidationError::OutOfRange);
    assert_eq!(
        err.to_string(),
        "transducer #1 (second): Value is not in acceptable range"
    );

    configuration.transducers[1].output_power = 1.0;
    configuration.simulation_geometry.cell_size = 0.0;
    let err = configuration.validate().expect_err("invalid geometry");
    assert_eq!(
        err,
        ConfigurationError::GeometryInvalid(ValidationError::InvalidCellSize)
    );
}
