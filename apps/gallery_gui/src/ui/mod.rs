//! UI layer for the gallery: app shell, thumbnail grid, and preview window.

pub mod app;
pub mod gallery;

pub use app::{GalleryApp, StartupConfig};
