//! Device profiles for multi-vendor prompt recognition.
//!
//! Each supported device type maps to a trailing prompt pattern and an
//! optional extra line terminator. The set is fixed; there is no runtime
//! registration.

mod definition;
mod registry;
pub mod vendors;

pub use definition::DeviceProfile;
pub use registry::ProfileTable;
