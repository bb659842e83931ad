pub mod controller;
pub mod dnd;
pub mod domain;
pub mod interaction;
pub mod navigator;
