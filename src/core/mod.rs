// src/core/mod.rs

pub mod arg_normalizer;
pub mod coordinator;
pub mod supervisor;
