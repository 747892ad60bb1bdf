// src/exam/mod.rs

pub mod grading;
pub mod session;
pub mod timing;
