//! Hardware identification from the system descriptor and the kernel's
//! hardware description text.
//!
//! Raspberry Pi boards carry no SMBIOS table, so they can only be recognised
//! by the board model the kernel appends to cpuinfo. All text matching lives
//! in [`identify_device`] so new hardware is added with a captured fixture.

use crate::source::SnapshotSource;
use crate::types::{DeviceIdentity, SystemDescriptor};

/// Product name of the first-party hardware line.
pub const UMBREL_HOME: &str = "Umbrel Home";
pub const RASPBERRY_PI: &str = "Raspberry Pi";

// SKU -> marketing name
const UMBREL_HOME_MODELS: &[(&str, &str)] = &[
    ("U130120", "Umbrel Home (2023)"),
    ("U130121", "Umbrel Home (2024)"),
];

// cpuinfo marker -> (device, device id); later entries take precedence
const RASPBERRY_PI_BOARDS: &[(&str, &str, &str)] = &[
    ("Raspberry Pi 5 ", "Raspberry Pi 5", "pi-5"),
    ("Raspberry Pi 4 ", "Raspberry Pi 4", "pi-4"),
];

const RASPBERRY_PI_MARKER: &str = "Raspberry Pi ";

const UNKNOWN_DEVICE_ID: &str = "unknown";

pub fn identify_device(desc: &SystemDescriptor, hardware_info: Option<&str>) -> DeviceIdentity {
    let mut manufacturer = desc.manufacturer.clone();
    let mut product_name = desc.model.clone();
    let mut model = desc.sku.clone();
    let mut serial = desc.serial.clone();
    let mut device = product_name.clone();
    let mut device_id = UNKNOWN_DEVICE_ID.to_string();

    if let Some((_, name)) = UMBREL_HOME_MODELS.iter().find(|(sku, _)| *sku == model) {
        device = (*name).to_string();
    }
    if product_name == UMBREL_HOME {
        device_id = model.clone();
    }

    if let Some(info) = hardware_info.filter(|info| info.contains(RASPBERRY_PI_MARKER)) {
        manufacturer = RASPBERRY_PI.to_string();
        product_name = RASPBERRY_PI.to_string();
        model = desc.version.clone();
        for (marker, name, id) in RASPBERRY_PI_BOARDS {
            if info.contains(marker) {
                device = (*name).to_string();
                device_id = (*id).to_string();
            }
        }
    }

    // model and serial are only trustworthy on first-party hardware
    if product_name != UMBREL_HOME {
        model.clear();
        serial.clear();
    }

    DeviceIdentity {
        device_id,
        device,
        product_name,
        manufacturer,
        model,
        serial,
        uuid: desc.uuid.clone(),
    }
}

pub async fn detect_device(source: &dyn SnapshotSource) -> DeviceIdentity {
    let desc = source.system_descriptor().await;
    let hardware_info = source.hardware_info().await;
    identify_device(&desc, hardware_info.as_deref())
}

pub async fn is_raspberry_pi(source: &dyn SnapshotSource) -> bool {
    detect_device(source).await.product_name == RASPBERRY_PI
}

pub async fn is_umbrel_home(source: &dyn SnapshotSource) -> bool {
    detect_device(source).await.product_name == UMBREL_HOME
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home(sku: &str) -> SystemDescriptor {
        SystemDescriptor {
            manufacturer: "Umbrel, Inc.".into(),
            model: UMBREL_HOME.into(),
            serial: "SN-0042".into(),
            uuid: "4c4c4544-0042".into(),
            sku: sku.into(),
            version: "1.0".into(),
        }
    }

    #[test]
    fn umbrel_home_2023() {
        let id = identify_device(&home("U130120"), None);
        assert_eq!(id.device, "Umbrel Home (2023)");
        assert_eq!(id.device_id, "U130120");
        assert_eq!(id.model, "U130120");
        assert_eq!(id.serial, "SN-0042");
        assert_eq!(id.product_name, UMBREL_HOME);
    }

    #[test]
    fn umbrel_home_2024() {
        let id = identify_device(&home("U130121"), None);
        assert_eq!(id.device, "Umbrel Home (2024)");
        assert_eq!(id.device_id, "U130121");
    }

    #[test]
    fn unknown_home_sku_keeps_product_name_as_device() {
        let id = identify_device(&home("U999999"), None);
        assert_eq!(id.device, UMBREL_HOME);
        assert_eq!(id.device_id, "U999999");
    }

    #[test]
    fn generic_pc_is_blanked() {
        let desc = SystemDescriptor {
            manufacturer: "Dell Inc.".into(),
            model: "OptiPlex 7050".into(),
            serial: "ABC123".into(),
            uuid: "u-1".into(),
            sku: "07A1".into(),
            version: "".into(),
        };
        let id = identify_device(&desc, Some("model name\t: Intel(R) Core(TM) i5-7500\n"));
        assert_eq!(id.device, "OptiPlex 7050");
        assert_eq!(id.device_id, "unknown");
        assert_eq!(id.manufacturer, "Dell Inc.");
        assert_eq!(id.model, "");
        assert_eq!(id.serial, "");
        assert_eq!(id.uuid, "u-1");
    }

    #[test]
    fn pi_marker_without_known_board() {
        let id = identify_device(
            &SystemDescriptor::default(),
            Some("Model\t\t: Raspberry Pi 3 Model B Rev 1.2\n"),
        );
        assert_eq!(id.product_name, RASPBERRY_PI);
        assert_eq!(id.manufacturer, RASPBERRY_PI);
        assert_eq!(id.device, "");
        assert_eq!(id.device_id, "unknown");
    }
}
