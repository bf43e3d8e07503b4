// Library exports for the FitTrack terminal client
// This allows testing of internal modules

pub mod api;
pub mod commands;
pub mod config;
pub mod storage;
pub mod ui;
