mod engine;
mod priority;
mod properties;

pub use engine::{Bp, NAME};
pub use properties::{Properties, PropertySet, UpdateType};
