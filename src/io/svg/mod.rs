//! SVG export of the rendered map.

mod map;
mod proj;
mod writer;

pub(crate) use proj::*;
pub(crate) use writer::*;
