//! HTTP Route Handlers

pub mod alerts;
pub mod dispatches;
pub mod resources;
