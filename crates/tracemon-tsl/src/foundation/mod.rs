//! Foundation types shared by every compiler stage.

pub mod span;
pub mod types;

pub use span::Span;
pub use types::{Type, TypeError, Width};
