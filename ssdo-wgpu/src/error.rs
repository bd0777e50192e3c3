use std::path::PathBuf;

use thiserror::Error;

use crate::graph::GraphError;

/// Fatal renderer errors. All of them surface during initialisation; the
/// per-frame path only reports surface hiccups.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("pipeline {label:?} failed validation: {message}")]
    Pipeline { label: String, message: String },
    #[error("failed to load environment face {path}: {message}")]
    Environment { path: PathBuf, message: String },
    #[error("invalid render settings: {0}")]
    Settings(String),
    #[error("invalid pass graph: {0}")]
    Graph(#[from] GraphError),
    #[error("surface texture unavailable: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
