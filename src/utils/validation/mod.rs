//! Input validation helpers

pub mod numeric;

pub use numeric::NumericValidator;
