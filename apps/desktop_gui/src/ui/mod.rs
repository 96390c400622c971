//! egui views for the workbench.

pub mod app;
