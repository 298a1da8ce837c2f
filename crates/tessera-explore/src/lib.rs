pub mod engine;
pub mod guidance;
pub mod requirement;
pub mod trace;
