//! Core types: typed linear algebra, skeleton data model and track labels

pub mod labels;
pub mod skeleton;
pub mod spaces;
pub mod transforms;
