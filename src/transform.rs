//! The measurement transform table: fourteen formulas mapping a raw 3-byte
//! triplet `(formula_id, a, b)` to a typed physical value with units.
//!
//! Every arithmetic expression below must be evaluated in the exact order
//! shown; the test vectors in this module's tests include values like
//! `56.800000000000004` that only reproduce under that exact operation
//! order, not an algebraically-equivalent rewrite.

use tracing::{debug, warn};

use crate::error::{DecodeError, Result};

/// A decoded measurement value. Modeled as a closed sum type rather than a
/// struct with optional fields, so the renderer and callers can match
/// exhaustively on shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementValue {
    /// A signed integer quantity with units, e.g. RPM or km/h.
    Integer {
        /// The decoded value.
        value: i64,
        /// Physical unit label.
        units: String,
    },
    /// A floating-point quantity with units.
    Float {
        /// The decoded value.
        value: f64,
        /// Physical unit label.
        units: String,
    },
    /// A text enumeration with no units, e.g. "COLD"/"WARM".
    Text {
        /// The decoded text.
        value: String,
    },
    /// A raw bitmask with no units, rendered as 8-bit binary of `bits & mask`.
    Bitmask {
        /// Raw status bits (triplet byte `a`).
        bits: u8,
        /// Mask selecting which bits are meaningful (triplet byte `b`).
        mask: u8,
    },
}

impl MeasurementValue {
    /// Render the value the way a human-facing display would: value plus
    /// units for Integer/Float, raw text for Text, 8-bit binary for Bitmask.
    pub fn render(&self) -> String {
        match self {
            MeasurementValue::Integer { value, units } => format!("{} {}", value, units),
            MeasurementValue::Float { value, units } => format!("{} {}", value, units),
            MeasurementValue::Text { value } => value.clone(),
            MeasurementValue::Bitmask { bits, mask } => format!("{:08b}", bits & mask),
        }
    }
}

/// Decode a raw measurement triplet `(formula_id, a, b)` into a typed,
/// unit-labeled value using the formula table for the given id.
pub fn decode_triplet(formula_id: u8, a: u8, b: u8) -> Result<MeasurementValue> {
    let (a, b) = (a as f64, b as f64);

    let value = match formula_id {
        1 => MeasurementValue::Integer {
            value: (a * 0.2 * b * 0.2) as i64,
            units: "RPM".to_string(),
        },
        2 => MeasurementValue::Float {
            value: a * 0.002 * b,
            units: "%".to_string(),
        },
        3 => MeasurementValue::Float {
            value: a * 0.002 * b,
            units: "Deg".to_string(),
        },
        4 => {
            let value = (b - 127.0).abs() * 0.01 * a;
            let units = if value < 128.0 { "BTDC" } else { "ATDC" };
            MeasurementValue::Float {
                value,
                units: units.to_string(),
            }
        }
        5 => MeasurementValue::Float {
            value: (0.1 * a * b) - (10.0 * a),
            units: "C".to_string(),
        },
        6 => MeasurementValue::Float {
            value: 0.001 * a * b,
            units: "V".to_string(),
        },
        7 => MeasurementValue::Integer {
            value: (0.01 * a * b) as i64,
            units: "km/h".to_string(),
        },
        8 => MeasurementValue::Float {
            value: 0.1 * a * b,
            units: "-".to_string(),
        },
        9 => MeasurementValue::Float {
            value: (b - 127.0) * 0.02 * a,
            units: "Deg".to_string(),
        },
        10 => MeasurementValue::Text {
            value: if a == 0.0 { "COLD" } else { "WARM" }.to_string(),
        },
        11 => MeasurementValue::Float {
            value: 0.0001 * a * (b - 128.0) + 1.0,
            units: "-".to_string(),
        },
        15 => MeasurementValue::Integer {
            value: (0.01 * a * b) as i64,
            units: "ms".to_string(),
        },
        16 => MeasurementValue::Bitmask {
            bits: a as u8,
            mask: b as u8,
        },
        other => {
            warn!(formula_id = other, a, b, "unknown transform formula id");
            return Err(DecodeError::UnknownFormula(other).into());
        }
    };

    debug!(formula_id, a, b, ?value, "decoded measurement triplet");
    Ok(value)
}
