// src/lib.rs

//! groupwatch: group post extraction, deduplication and forwarding.

pub mod dom;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
