//! Edits the transducer table and simulation panel perform on a
//! configuration. Every function returns a new configuration; pass them to
//! [`crate::SyncStore::modify`] to apply and save.

use serde_json::Value;
use shared::{
    domain::{LengthScale, SimulationGeometryRow, Transducer, TransducerRow},
    protocol::Configuration,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no transducer at row {index} (table has {len} rows)")]
    NoSuchRow { index: usize, len: usize },
}

pub fn transducer_rows(configuration: &Configuration, scale: LengthScale) -> Vec<TransducerRow> {
    configuration
        .transducers
        .iter()
        .map(|transducer| transducer.to_row(scale))
        .collect()
}

pub fn edit_transducer_row(
    configuration: &Configuration,
    index: usize,
    row: &Value,
    scale: LengthScale,
) -> Result<Configuration, EditError> {
    let len = configuration.transducers.len();
    let current = configuration
        .transducers
        .get(index)
        .ok_or(EditError::NoSuchRow { index, len })?;

    let edited = current.apply_row(row, scale);
    if &edited == current {
        debug!(index, "editor: row edit left transducer unchanged");
    }

    let mut next = configuration.clone();
    next.transducers[index] = edited;
    Ok(next)
}

/// Appends a default transducer with an unused `transducer #N` id.
pub fn add_transducer(configuration: &Configuration) -> Configuration {
    let transducer = Transducer {
        id: auto_transducer_id(&configuration.transducers),
        ..Transducer::default()
    };
    let mut next = configuration.clone();
    next.transducers.push(transducer);
    next
}

/// Removes the given rows. Nothing is removed if any index is out of range.
pub fn remove_transducers(
    configuration: &Configuration,
    indices: &[usize],
) -> Result<Configuration, EditError> {
    let len = configuration.transducers.len();
    if let Some(&index) = indices.iter().find(|&&index| index >= len) {
        return Err(EditError::NoSuchRow { index, len });
    }

    let mut next = configuration.clone();
    next.transducers = configuration
        .transducers
        .iter()
        .enumerate()
        .filter(|(index, _)| !indices.contains(index))
        .map(|(_, transducer)| transducer.clone())
        .collect();
    Ok(next)
}

pub fn geometry_row(configuration: &Configuration, scale: LengthScale) -> SimulationGeometryRow {
    configuration.simulation_geometry.to_row(scale)
}

pub fn edit_geometry_row(
    configuration: &Configuration,
    row: &Value,
    scale: LengthScale,
) -> Configuration {
    let mut next = configuration.clone();
    next.simulation_geometry = configuration.simulation_geometry.apply_row(row, scale);
    next
}

pub fn replace_transducers(
    configuration: &Configuration,
    transducers: Vec<Transducer>,
) -> Configuration {
    Configuration {
        transducers,
        simulation_geometry: configuration.simulation_geometry.clone(),
    }
}

fn auto_transducer_id(existing: &[Transducer]) -> String {
    (existing.len() + 1..)
        .map(|n| format!("transducer #{n}"))
        .find(|candidate| existing.iter().all(|transducer| &transducer.id != candidate))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
