//! Built-in device profiles.

pub mod arista;
pub mod cisco;
pub mod force10;
pub mod hp_apm;
pub mod junos;
pub mod root_unix;
