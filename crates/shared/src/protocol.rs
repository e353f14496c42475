use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{SimulationGeometry, SimulationGeometryData, Transducer, TransducerData},
    error::ConfigurationError,
};

/// Path of the configuration endpoint relative to the server root.
pub const CONFIG_ENDPOINT: &str = "api/data";

/// Body exchanged with `GET`/`POST` on [`CONFIG_ENDPOINT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPacket {
    pub transducers: Vec<TransducerData>,
    pub simulation_geometry: SimulationGeometryData,
}

/// The in-memory configuration being edited.
///
/// Deserialization is tolerant: every entity is built by overlaying whatever
/// fields the body carries onto defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "ConfigPacket")]
pub struct Configuration {
    pub transducers: Vec<Transducer>,
    pub simulation_geometry: SimulationGeometry,
}

impl Configuration {
    pub fn from_value(raw: &Value) -> Self {
        let transducers = raw
            .get("transducers")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Transducer::from_data).collect())
            .unwrap_or_default();
        let simulation_geometry = raw
            .get("simulation_geometry")
            .map(SimulationGeometry::from_data)
            .unwrap_or_default();

        Self {
            transducers,
            simulation_geometry,
        }
    }

    pub fn to_packet(&self) -> ConfigPacket {
        ConfigPacket {
            transducers: self.transducers.iter().map(Transducer::to_data).collect(),
            simulation_geometry: self.simulation_geometry.to_data(),
        }
    }

    /// Validates every transducer in order, then the geometry.
    pub fn validate(&self) -> Result<&Self, ConfigurationError> {
        for (index, transducer) in self.transducers.iter().enumerate() {
            transducer
                .validate()
                .map_err(|source| ConfigurationError::TransducerInvalid {
                    index,
                    id: transducer.id.clone(),
                    source,
                })?;
        }
        self.simulation_geometry.validate()?;
        Ok(self)
    }
}

impl From<Value> for Configuration {
    fn from(raw: Value) -> Self {
        Self::from_value(&raw)
    }
}

impl From<Configuration> for ConfigPacket {
    fn from(configuration: Configuration) -> Self {
        configuration.to_packet()
    }
}

impl From<ConfigPacket> for Configuration {
    fn from(packet: ConfigPacket) -> Self {
        Self {
            transducers: packet.transducers.into_iter().map(Transducer::from).collect(),
            simulation_geometry: packet.simulation_geometry.into(),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
