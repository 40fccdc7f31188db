//! Juniper JUNOS profile.
//!
//! Any of the operational, configuration or shell prompts counts as ready:
//!
//! ```text
//! user@router>
//! user@router#
//! user@router%
//! ```

use crate::platform::DeviceProfile;

/// Create the JUNOS profile.
pub fn profile() -> DeviceProfile {
    DeviceProfile::new("junos", r"[>%#] $").expect("static junos prompt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_junos_prompt_match() {
        let profile = profile();
        assert!(profile.prompt.is_match(b"user@router> "));
        assert!(profile.prompt.is_match(b"{master:0}[edit]\r\nuser@router# "));
        assert!(profile.prompt.is_match(b"root@router:RE:0% "));
        assert!(!profile.prompt.is_match(b"user@router$ "));
    }
}
