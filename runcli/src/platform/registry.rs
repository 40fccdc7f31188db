//! Fixed table of supported device profiles.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::definition::DeviceProfile;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Built-in profile table, fixed for the life of the process.
static BUILTIN: Lazy<ProfileTable> = Lazy::new(|| {
    ProfileTable::from_profiles([
        vendors::arista::profile(),
        vendors::force10::profile(),
        vendors::hp_apm::profile(),
        vendors::root_unix::profile(),
        vendors::junos::profile(),
        vendors::cisco::profile(),
    ])
});

/// Lookup table from device type identifier to [`DeviceProfile`].
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: IndexMap<String, DeviceProfile>,
}

impl ProfileTable {
    /// Build a table from a set of profiles. Identifiers are stored lower-case.
    pub fn from_profiles(profiles: impl IntoIterator<Item = DeviceProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.device_type.to_lowercase(), p))
            .collect();
        Self { profiles }
    }

    /// The built-in table.
    pub fn builtin() -> &'static ProfileTable {
        &BUILTIN
    }

    /// Look up a profile by device type (case-insensitive).
    pub fn lookup(&self, device_type: &str) -> Result<&DeviceProfile> {
        self.profiles
            .get(&device_type.to_lowercase())
            .ok_or_else(|| {
                PlatformError::UnsupportedDeviceType {
                    device_type: device_type.to_string(),
                }
                .into()
            })
    }

    /// Check if a device type is supported.
    pub fn contains(&self, device_type: &str) -> bool {
        self.profiles.contains_key(&device_type.to_lowercase())
    }

    /// List all supported device types in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_every_builtin_type_resolves() {
        let table = ProfileTable::builtin();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            ["arista", "force10", "hp_apm", "root_unix", "junos", "cisco"]
        );

        for name in names {
            let profile = table.lookup(name).unwrap();
            assert_eq!(profile.device_type, name);
            assert!(profile.prompt.as_str().ends_with('$'));
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = ProfileTable::builtin();
        assert_eq!(table.lookup("Arista").unwrap().device_type, "arista");
        assert!(table.contains("JUNOS"));
    }

    #[test]
    fn test_unknown_type_fails() {
        let table = ProfileTable::builtin();
        for name in ["ios-xr", "", "default", "arista "] {
            match table.lookup(name) {
                Err(Error::Platform(PlatformError::UnsupportedDeviceType { device_type })) => {
                    assert_eq!(device_type, name);
                }
                other => panic!("expected UnsupportedDeviceType, got {other:?}"),
            }
        }
    }
}
