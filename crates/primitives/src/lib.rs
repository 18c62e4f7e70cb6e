//! Collection of generic internal data types that are used widely.

pub mod buf;
pub mod params;

pub use buf::Bytes32;
pub use params::RollupConfig;
