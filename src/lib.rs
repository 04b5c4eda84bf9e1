// src/lib.rs

//! doughwatch — Pizza Index monitor library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
