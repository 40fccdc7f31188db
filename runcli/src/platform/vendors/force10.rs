//! Dell Force10 FTOS profile.
//!
//! FTOS needs a carriage return in addition to the newline before it will
//! act on a command line.

use crate::platform::DeviceProfile;

/// Create the Force10 profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("force10", r"#$")
        .expect("static force10 prompt")
        .with_extra_terminator("\r")
}
