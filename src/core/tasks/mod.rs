// src/core/tasks/mod.rs

//! Long-running maintenance tasks driven from outside the pool itself.

pub mod pool_cleaner;
