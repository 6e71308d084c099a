//! Terminal output helpers for the arbor CLI.
//!
//! - [`color`] – color mode detection (`--color`, `NO_COLOR`, TTY)
//! - [`style`] – message prefixes and consistent formatting

pub mod color;
pub mod style;

pub use color::ColorMode;
pub use style::{MessageType, Style};
