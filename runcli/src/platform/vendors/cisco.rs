//! Cisco IOS / NX-OS profile.

use crate::platform::DeviceProfile;

/// Create the Cisco profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("cisco", r"# $").expect("static cisco prompt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_prompt_match() {
        let profile = profile();
        assert!(profile.prompt.is_match(b"nexus9k# "));
        assert!(!profile.prompt.is_match(b"nexus9k#"));
    }
}
