//! The account unlock card: password form, validation and the submit cycle.

mod component;
pub mod form;

pub use component::*;
