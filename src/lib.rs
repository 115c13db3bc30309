//! Matvar - procedural material variation for building materials

pub mod core;
pub mod variation;
pub mod shader;
pub mod material;
