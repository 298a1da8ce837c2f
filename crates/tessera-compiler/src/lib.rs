pub mod compile;
pub mod index;
pub mod rules;

pub use compile::{compile, Composition};
