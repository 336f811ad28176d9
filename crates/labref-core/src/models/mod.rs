//! Domain models for the labref engine.

mod classification;
mod laboratory;
mod patient;
mod reference;

pub use classification::*;
pub use laboratory::*;
pub use patient::*;
pub use reference::*;
