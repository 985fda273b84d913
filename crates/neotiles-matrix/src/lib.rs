//! Hardware matrices for neotiles.
//!
//! [`StripMatrix`] drives a physical LED strip folded into a grid (one panel
//! or a chain of them) through a [`StripLayout`]. [`TerminalMatrix`] draws
//! the matrix in a terminal instead, for development without hardware.

pub mod layout;
pub mod strip;
pub mod terminal;

pub use layout::{StripLayout, Wiring};
pub use strip::{ChannelOrder, LedStrip, MemoryStrip, StripMatrix, WriterStrip};
pub use terminal::TerminalMatrix;
