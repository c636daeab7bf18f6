// src/lib.rs

pub mod api;
pub mod app_state;
pub mod archive;
pub mod collation;
pub mod config;
pub mod error;
pub mod origin;
pub mod service;
