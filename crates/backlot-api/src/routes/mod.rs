//! Route modules for the asset generation API.

pub mod assets;
pub mod batch;
pub mod health;
