//! Known measurement groups and the metric labels their three slots map to.

use tracing::{debug, warn};

use crate::error::{DecodeError, Result};
use crate::transform::{decode_triplet, MeasurementValue};

/// A labeled physical quantity a measurement group slot can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Engine speed.
    Rpm,
    /// Coolant temperature.
    CoolantTemp,
    /// Battery voltage.
    BatteryVoltage,
    /// Fuel injection time.
    InjectionTime,
    /// Throttle plate angle.
    ThrottleAngle,
    /// Intake air temperature.
    AirIntakeTemp,
    /// Vehicle speed.
    Speed,
    /// Sentinel for groups that use fewer than three slots.
    None,
}

/// A decoded measurement, labeled with the metric it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Which physical quantity this is.
    pub metric: Metric,
    /// The decoded value.
    pub value: MeasurementValue,
}

/// Look up the ordered metric triple for a known measurement group id.
fn metrics_for_group(group_id: u8) -> Option<[Metric; 3]> {
    match group_id {
        1 => Some([Metric::Rpm, Metric::CoolantTemp, Metric::None]),
        2 => Some([Metric::Rpm, Metric::BatteryVoltage, Metric::InjectionTime]),
        3 => Some([Metric::Rpm, Metric::ThrottleAngle, Metric::AirIntakeTemp]),
        4 => Some([Metric::Rpm, Metric::Speed, Metric::None]),
        _ => None,
    }
}

/// Decode a MeasurementGroup block's 9 data bytes (three triplets) against
/// the given group id, producing three labeled measurements in slot order.
pub fn decode_group(group_id: u8, data: &[u8]) -> Result<[Measurement; 3]> {
    if data.len() != 9 {
        warn!(group_id, data_len = data.len(), "wrong measurement group data length");
        return Err(DecodeError::WrongDataLength(data.len()).into());
    }

    let metrics = metrics_for_group(group_id).ok_or_else(|| {
        warn!(group_id, "unknown measurement group id");
        DecodeError::UnknownGroup(group_id)
    })?;

    let mut out: Vec<Measurement> = Vec::with_capacity(3);
    for (i, metric) in metrics.into_iter().enumerate() {
        let triplet = &data[i * 3..i * 3 + 3];
        let value = decode_triplet(triplet[0], triplet[1], triplet[2])?;
        out.push(Measurement { metric, value });
    }

    debug!(group_id, "decoded measurement group");
    Ok([out[0].clone(), out[1].clone(), out[2].clone()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::MeasurementValue;

    #[test]
    fn decodes_group_three_with_real_captured_data() {
        let data = [
            0x01, 0xC8, 0x31, // RPM
            0x05, 0x07, 0xD4, // ThrottleAngle (formula 5, "C" units per formula table)
            0x05, 0x0E, 0xBF, // AirIntakeTemp
        ];
        let measurements = decode_group(3, &data).unwrap();

        assert_eq!(measurements[0].metric, Metric::Rpm);
        assert_eq!(
            measurements[0].value,
            MeasurementValue::Integer {
                value: 392,
                units: "RPM".to_string()
            }
        );
        assert_eq!(measurements[1].metric, Metric::ThrottleAngle);
        match &measurements[1].value {
            MeasurementValue::Float { value, .. } => assert_eq!(*value, 78.4),
            other => panic!("unexpected variant: {:?}", other),
        }
        assert_eq!(measurements[2].metric, Metric::AirIntakeTemp);
        match &measurements[2].value {
            MeasurementValue::Float { value, .. } => assert_eq!(*value, 127.40000000000003),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn unknown_group_is_decode_error() {
        assert!(decode_group(250, &[0u8; 9]).is_err());
    }

    #[test]
    fn wrong_data_length_is_decode_error() {
        assert!(decode_group(1, &[0u8; 6]).is_err());
    }
}
