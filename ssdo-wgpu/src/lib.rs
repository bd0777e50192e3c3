//! wgpu backend for the SSDO deferred renderer.
//!
//! Eight offscreen stages run in a fixed order each frame (geometry, Phong
//! lighting, SSDO direct and its blur, SSDO indirect and its blur, skybox,
//! mixer). The order and data flow are declared in [`graph::STAGES`]; the
//! [`renderer::SsdoRenderer`] walks that declaration against the targets in a
//! [`context::RenderContext`].

pub mod backend;
pub mod camera;
pub mod composite;
pub mod context;
pub mod environment;
pub mod error;
pub mod graph;
pub mod passes;
pub mod pipeline;
pub mod render_targets;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use backend::GpuBackend;
pub use camera::Camera;
pub use composite::CompositeMode;
pub use context::RenderContext;
pub use environment::EnvironmentMap;
pub use error::{RenderError, Result};
pub use renderer::SsdoRenderer;
pub use scene::{PointLight, Scene};
pub use settings::RenderSettings;
