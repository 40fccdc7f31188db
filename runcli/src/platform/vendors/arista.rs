//! Arista EOS profile.
//!
//! Commands are run from privileged EXEC, so only the `#` prompt is
//! recognised:
//!
//! ```text
//! switch#
//! switch(config-if-Et1)#
//! ```

use crate::platform::DeviceProfile;

/// Create the Arista profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("arista", r"#$").expect("static arista prompt")
}
