//! API request handlers

mod enrollments;
mod health;

pub use enrollments::*;
pub use health::*;
