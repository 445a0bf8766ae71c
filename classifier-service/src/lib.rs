//! Garment image classification service backed by a Gemini vision model.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
