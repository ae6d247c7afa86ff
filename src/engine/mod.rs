pub mod egui_integration;
pub mod input;
