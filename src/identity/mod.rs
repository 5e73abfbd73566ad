//! Identity generation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field names, in the order they are written to every store.
pub const FIELDS: [&str; 4] = ["machineId", "macMachineId", "devDeviceId", "sqmId"];

/// The set of identifiers the target application treats as its machine identity.
///
/// `machine_id` and `mac_machine_id` always carry the same value within one
/// rotation. The other two are drawn independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub machine_id: String,
    pub mac_machine_id: String,
    pub dev_device_id: String,
    pub sqm_id: String,
}

impl Identity {
    /// Generate a fresh identity.
    ///
    /// Every value comes from a v4 UUID backed by the OS random source, so
    /// consecutive calls never share state.
    #[must_use]
    pub fn generate() -> Self {
        let machine_id = Uuid::new_v4().hyphenated().to_string();

        Self {
            mac_machine_id: machine_id.clone(),
            machine_id,
            dev_device_id: Uuid::new_v4().hyphenated().to_string(),
            sqm_id: format!("{{{}}}", Uuid::new_v4().hyphenated().to_string().to_uppercase()),
        }
    }

    /// Field name and value pairs in [`FIELDS`] order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            (FIELDS[0], self.machine_id.as_str()),
            (FIELDS[1], self.mac_machine_id.as_str()),
            (FIELDS[2], self.dev_device_id.as_str()),
            (FIELDS[3], self.sqm_id.as_str()),
        ]
    }
}
