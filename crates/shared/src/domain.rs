//! Transducer and simulation-region records with their two views.
//!
//! The *flat* view ([`TransducerRow`], [`SimulationGeometryRow`]) expands
//! vectors into one scalar per axis for grid editing and is expressed in
//! display units. The *structured* view ([`TransducerData`],
//! [`SimulationGeometryData`]) keeps whole vectors in SI units and is the wire
//! format. Applying either view is a pure transform: the receiver is left
//! untouched and a new record is returned. Incoming views are raw JSON so that
//! malformed cells can be ignored field by field.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ValidationError,
    parse::{number_or, parse_number, truthy_text_or, vector_or},
};

pub type Vec3 = [f64; 3];

/// Added to every region extent so a degenerate axis is never exactly zero;
/// renderers treat a zero-sized box as unit-sized.
pub const REGION_EPSILON: f64 = f64::MIN_POSITIVE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    X,
    Y,
    Z,
}

impl FromStr for Plane {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            _ => Err(ValidationError::InvalidPlane),
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        f.write_str(axis)
    }
}

/// Display units per SI unit for lengths shown in the flat views.
///
/// A flat-view round trip is exact when the factor is a power of two. Other
/// factors reproduce stored lengths to within floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthScale(f64);

impl LengthScale {
    pub const SI: Self = Self(1.0);

    /// Only positive, finite factors are accepted.
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    pub fn to_display(self, stored: f64) -> f64 {
        stored * self.0
    }

    pub fn to_storage(self, displayed: f64) -> f64 {
        displayed / self.0
    }

    /// Parsed display value converted to storage units, or `previous`.
    pub fn storage_or(self, raw: Option<&Value>, previous: f64) -> f64 {
        raw.and_then(|value| parse_number(value).ok())
            .map_or(previous, |displayed| self.to_storage(displayed))
    }

    fn display_vec(self, stored: Vec3) -> Vec3 {
        stored.map(|component| self.to_display(component))
    }
}

impl Default for LengthScale {
    fn default() -> Self {
        Self::SI
    }
}

/// One acoustic emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Transducer {
    pub id: String,
    pub position: Vec3,
    pub target: Vec3,
    pub radius: f64,
    pub phase_shift: f64,
    pub loss_factor: f64,
    pub output_power: f64,
    pub wavelength: f64,
}

impl Default for Transducer {
    fn default() -> Self {
        Self {
            id: String::new(),
            position: [0.0, 0.0, 0.0],
            target: [0.0, 1.0, 0.0],
            radius: 0.5,
            phase_shift: 0.0,
            loss_factor: 1.0,
            output_power: 1.0,
            wavelength: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransducerRow {
    pub id: String,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub target_z: f64,
    pub radius: f64,
    pub phase_shift: f64,
    pub loss_factor: f64,
    pub output_power: f64,
    pub wavelength: f64,
    /// Grid row identity only. Regenerated on every read, ignored on write.
    pub row_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransducerData {
    pub id: String,
    pub position: Vec3,
    pub target: Vec3,
    pub radius: f64,
    pub phase_shift: f64,
    pub loss_factor: f64,
    pub output_power: f64,
    pub wavelength: f64,
}

impl Transducer {
    pub fn to_row(&self, scale: LengthScale) -> TransducerRow {
        let [position_x, position_y, position_z] = scale.display_vec(self.position);
        let [target_x, target_y, target_z] = scale.display_vec(self.target);
        TransducerRow {
            id: self.id.clone(),
            position_x,
            position_y,
            position_z,
            target_x,
            target_y,
            target_z,
            radius: scale.to_display(self.radius),
            phase_shift: self.phase_shift,
            loss_factor: self.loss_factor,
            output_power: self.output_power,
            wavelength: self.wavelength,
            row_id: Uuid::new_v4(),
        }
    }

    /// Overlays a flat row. Each cell is applied independently; missing or
    /// unparsable cells keep the current value.
    pub fn apply_row(&self, row: &Value, scale: LengthScale) -> Self {
        let cell = |key: &str| row.get(key);
        Self {
            id: truthy_text_or(cell("id"), &self.id),
            position: [
                scale.storage_or(cell("position_x"), self.position[0]),
                scale.storage_or(cell("position_y"), self.position[1]),
                scale.storage_or(cell("position_z"), self.position[2]),
            ],
            target: [
                scale.storage_or(cell("target_x"), self.target[0]),
                scale.storage_or(cell("target_y"), self.target[1]),
                scale.storage_or(cell("target_z"), self.target[2]),
            ],
            radius: scale.storage_or(cell("radius"), self.radius),
            phase_shift: number_or(cell("phase_shift"), self.phase_shift),
            loss_factor: number_or(cell("loss_factor"), self.loss_factor),
            output_power: number_or(cell("output_power"), self.output_power),
            wavelength: number_or(cell("wavelength"), self.wavelength),
        }
    }

    pub fn from_row(row: &Value, scale: LengthScale) -> Self {
        Self::default().apply_row(row, scale)
    }

    pub fn to_data(&self) -> TransducerData {
        TransducerData {
            id: self.id.clone(),
            position: self.position,
            target: self.target,
            radius: self.radius,
            phase_shift: self.phase_shift,
            loss_factor: self.loss_factor,
            output_power: self.output_power,
            wavelength: self.wavelength,
        }
    }

    /// Overlays a structured value. A vector that fails coercion is left
    /// unchanged as a whole.
    pub fn apply_data(&self, data: &Value) -> Self {
        let field = |key: &str| data.get(key);
        Self {
            id: truthy_text_or(field("id"), &self.id),
            position: vector_or(field("position"), self.position),
            target: vector_or(field("target"), self.target),
            radius: number_or(field("radius"), self.radius),
            phase_shift: number_or(field("phase_shift"), self.phase_shift),
            loss_factor: number_or(field("loss_factor"), self.loss_factor),
            output_power: number_or(field("output_power"), self.output_power),
            wavelength: number_or(field("wavelength"), self.wavelength),
        }
    }

    pub fn from_data(data: &Value) -> Self {
        Self::default().apply_data(data)
    }

    pub fn validate(&self) -> Result<&Self, ValidationError> {
        if self.position == self.target {
            return Err(ValidationError::SameCoordinate);
        }
        if self.radius < 0.0
            || !(0.0..=1.0).contains(&self.loss_factor)
            || self.output_power < 0.0
            || self.wavelength < 0.0
        {
            return Err(ValidationError::OutOfRange);
        }
        Ok(self)
    }
}

impl From<TransducerData> for Transducer {
    fn from(data: TransducerData) -> Self {
        Self {
            id: data.id,
            position: data.position,
            target: data.target,
            radius: data.radius,
            phase_shift: data.phase_shift,
            loss_factor: data.loss_factor,
            output_power: data.output_power,
            wavelength: data.wavelength,
        }
    }
}

/// Rectangular sampling region for field visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationGeometry {
    /// Axis held constant for the 2D slice. Kept as entered; see [`Self::plane`].
    pub plane: String,
    pub begin: Vec3,
    pub end: Vec3,
    pub cell_size: f64,
    pub potential_compute_const_1: f64,
    pub potential_compute_const_2: f64,
}

impl Default for SimulationGeometry {
    fn default() -> Self {
        Self {
            plane: Plane::X.to_string(),
            begin: [-10.0, 0.0, -10.0],
            end: [10.0, 0.0, 10.0],
            cell_size: 0.01,
            potential_compute_const_1: 1.0,
            potential_compute_const_2: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationGeometryRow {
    pub plane: String,
    pub begin_x: f64,
    pub begin_y: f64,
    pub begin_z: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub end_z: f64,
    pub cell_size: f64,
    pub potential_compute_const_1: f64,
    pub potential_compute_const_2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationGeometryData {
    pub plane: String,
    pub begin: Vec3,
    pub end: Vec3,
    pub cell_size: f64,
    pub potential_compute_const_1: f64,
    pub potential_compute_const_2: f64,
}

impl SimulationGeometry {
    pub fn plane(&self) -> Result<Plane, ValidationError> {
        self.plane.parse()
    }

    pub fn to_row(&self, scale: LengthScale) -> SimulationGeometryRow {
        let [begin_x, begin_y, begin_z] = scale.display_vec(self.begin);
        let [end_x, end_y, end_z] = scale.display_vec(self.end);
        SimulationGeometryRow {
            plane: self.plane.clone(),
            begin_x,
            begin_y,
            begin_z,
            end_x,
            end_y,
            end_z,
            cell_size: scale.to_display(self.cell_size),
            potential_compute_const_1: self.potential_compute_const_1,
            potential_compute_const_2: self.potential_compute_const_2,
        }
    }

    pub fn apply_row(&self, row: &Value, scale: LengthScale) -> Self {
        let cell = |key: &str| row.get(key);
        Self {
            plane: truthy_text_or(cell("plane"), &self.plane),
            begin: [
                scale.storage_or(cell("begin_x"), self.begin[0]),
                scale.storage_or(cell("begin_y"), self.begin[1]),
                scale.storage_or(cell("begin_z"), self.begin[2]),
            ],
            end: [
                scale.storage_or(cell("end_x"), self.end[0]),
                scale.storage_or(cell("end_y"), self.end[1]),
                scale.storage_or(cell("end_z"), self.end[2]),
            ],
            cell_size: scale.storage_or(cell("cell_size"), self.cell_size),
            potential_compute_const_1: number_or(
                cell("potential_compute_const_1"),
                self.potential_compute_const_1,
            ),
            potential_compute_const_2: number_or(
                cell("potential_compute_const_2"),
                self.potential_compute_const_2,
            ),
        }
    }

    pub fn from_row(row: &Value, scale: LengthScale) -> Self {
        Self::default().apply_row(row, scale)
    }

    pub fn to_data(&self) -> SimulationGeometryData {
        SimulationGeometryData {
            plane: self.plane.clone(),
            begin: self.begin,
            end: self.end,
            cell_size: self.cell_size,
            potential_compute_const_1: self.potential_compute_const_1,
            potential_compute_const_2: self.potential_compute_const_2,
        }
    }

    pub fn apply_data(&self, data: &Value) -> Self {
        let field = |key: &str| data.get(key);
        Self {
            plane: truthy_text_or(field("plane"), &self.plane),
            begin: vector_or(field("begin"), self.begin),
            end: vector_or(field("end"), self.end),
            cell_size: number_or(field("cell_size"), self.cell_size),
            potential_compute_const_1: number_or(
                field("potential_compute_const_1"),
                self.potential_compute_const_1,
            ),
            potential_compute_const_2: number_or(
                field("potential_compute_const_2"),
                self.potential_compute_const_2,
            ),
        }
    }

    pub fn from_data(data: &Value) -> Self {
        Self::default().apply_data(data)
    }

    /// Extent of the region per axis, never exactly zero.
    pub fn cubic_size(&self) -> Vec3 {
        std::array::from_fn(|axis| (self.end[axis] - self.begin[axis]).abs() + REGION_EPSILON)
    }

    /// Center of the region.
    pub fn cubic_position(&self) -> Vec3 {
        std::array::from_fn(|axis| (self.end[axis] + self.begin[axis]) / 2.0)
    }

    pub fn validate(&self) -> Result<&Self, ValidationError> {
        self.plane()?;
        if self.cell_size.is_nan() || self.cell_size <= 0.0 {
            return Err(ValidationError::InvalidCellSize);
        }
        Ok(self)
    }
}

impl From<SimulationGeometryData> for SimulationGeometry {
    fn from(data: SimulationGeometryData) -> Self {
        Self {
            plane: data.plane,
            begin: data.begin,
            end: data.end,
            cell_size: data.cell_size,
            potential_compute_const_1: data.potential_compute_const_1,
            potential_compute_const_2: data.potential_compute_const_2,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
