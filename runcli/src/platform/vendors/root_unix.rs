//! Unix shell logged in as root (`# ` prompt).

use crate::platform::DeviceProfile;

/// Create the root Unix shell profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("root_unix", r"# $").expect("static root_unix prompt")
}
