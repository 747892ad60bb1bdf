// src/models/mod.rs

pub mod paper;
pub mod solution;
pub mod stats;
pub mod user;
pub mod video;
