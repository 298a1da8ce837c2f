pub mod action;
pub mod lsts;
pub mod parse;
pub mod pattern;
pub mod sequence;
pub mod template;

pub use action::{Action, ActionCode, ComponentId};
pub use lsts::{Lsts, LstsTransition};
