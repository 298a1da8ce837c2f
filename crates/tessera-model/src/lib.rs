pub mod cache;
pub mod explicit;
pub mod lts;
pub mod product;
pub mod synthetic;

pub use cache::{CachedState, CachingModel};
pub use explicit::{LstsModel, LstsState};
pub use lts::{Model, ModelError, Transition, Transitions};
pub use product::{ProductModel, ProductState};
pub use synthetic::{SyntheticModel, SyntheticState};
