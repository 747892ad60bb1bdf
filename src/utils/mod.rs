// src/utils/mod.rs

pub mod hash;
pub mod html;
pub mod json;
pub mod jwt;
