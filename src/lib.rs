pub mod config;
pub mod diagram_utils;
pub mod gui;
