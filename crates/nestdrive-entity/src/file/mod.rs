//! File domain entities.

pub mod locator;
pub mod model;

pub use locator::Locator;
pub use model::File;
