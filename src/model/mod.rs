//! Document model types for converted proposal content.
//!
//! This module defines the intermediate representation that bridges the
//! generated text and the DOCX renderer. Blocks are transient: they are
//! rebuilt from scratch for every conversion.

mod block;
mod brief;
mod table;
mod terms;

pub use block::{plain_text, Block, InlineRun};
pub use brief::{Brief, Tone};
pub use table::Grid;
pub use terms::{Deliverable, Financials, Phase, Signature};
