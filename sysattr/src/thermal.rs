//! CPU temperature with a device-specific warning level.

use crate::device::{detect_device, RASPBERRY_PI};
use crate::error::UsageError;
use crate::source::SnapshotSource;
use crate::types::{DeviceIdentity, ThermalReading, Warning};

/// Inclusive lower bounds, °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warm: f64,
    pub hot: f64,
}

pub const GENERIC_THRESHOLDS: Thresholds = Thresholds {
    warm: 90.0,
    hot: 95.0,
};

pub const RASPBERRY_PI_THRESHOLDS: Thresholds = Thresholds {
    warm: 80.0,
    hot: 85.0,
};

pub fn thresholds_for(device: &DeviceIdentity) -> Thresholds {
    if device.product_name == RASPBERRY_PI {
        RASPBERRY_PI_THRESHOLDS
    } else {
        GENERIC_THRESHOLDS
    }
}

pub fn classify(temperature: f64, t: Thresholds) -> Warning {
    if temperature >= t.hot {
        Warning::Hot
    } else if temperature >= t.warm {
        Warning::Warm
    } else {
        Warning::Normal
    }
}

pub async fn cpu_temperature(source: &dyn SnapshotSource) -> Result<ThermalReading, UsageError> {
    let temperature = source
        .temperature()
        .await
        .filter(|t| t.is_finite())
        .ok_or(UsageError::SensorUnavailable)?;
    let device = detect_device(source).await;
    Ok(ThermalReading {
        temperature,
        warning: classify(temperature, thresholds_for(&device)),
    })
}
