//! SAT-style dependency resolution over catalog entities: variable
//! sources seed and augment a resolution problem, the search finds a
//! consistent selection, and the façade ties both together — spec.md
//! §2 components D, E, F.

pub mod desire;
pub mod entity_source;
pub mod error;
pub mod facade;
pub mod problem;
pub mod search;
pub mod sources;

pub use desire::Desire;
pub use entity_source::EntitySource;
pub use error::{Error, Result};
pub use facade::Resolver;
pub use problem::{Builder, ResolutionProblem, Solution};
