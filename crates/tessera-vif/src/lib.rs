pub mod adapter;
pub mod params;

pub use adapter::{Adapter, AdapterError, ModelOnlyAdapter, ScriptedAdapter};
pub use params::{AdapterParams, ParamError};
