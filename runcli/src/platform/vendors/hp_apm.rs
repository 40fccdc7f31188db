//! HP APM profile. The operational prompt ends in `> `.

use crate::platform::DeviceProfile;

/// Create the HP APM profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("hp_apm", r"> $").expect("static hp_apm prompt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hp_apm_prompt_match() {
        let profile = profile();
        assert!(profile.prompt.is_match(b"apm01> "));
        assert!(!profile.prompt.is_match(b"apm01>"));
        assert!(!profile.prompt.is_match(b"apm01# "));
    }
}
