//! Read entities definitions.

pub mod package;
