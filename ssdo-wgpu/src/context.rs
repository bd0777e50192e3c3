use crate::camera::Camera;
use crate::composite::CompositeMode;
use crate::render_targets::{FormatSupport, RenderTargetRegistry};
use crate::scene::Scene;

/// Everything the pass pipeline reads each frame: targets, camera, scene and
/// the composite selector. Passed by reference into the renderer.
pub struct RenderContext {
    pub targets: RenderTargetRegistry,
    pub camera: Camera,
    pub scene: Scene,
    pub composite: CompositeMode,
    /// Line rasterisation for the geometry stage.
    pub wireframe: bool,
}

impl RenderContext {
    /// `support` decides the target formats; see `GpuBackend::format_support`.
    pub fn new(
        device: &wgpu::Device,
        support: FormatSupport,
        width: u32,
        height: u32,
        camera: Camera,
        scene: Scene,
    ) -> Self {
        Self {
            targets: RenderTargetRegistry::new(device, support, width, height),
            camera,
            scene,
            composite: CompositeMode::default(),
            wireframe: false,
        }
    }

    /// Reallocates targets and updates the aspect ratio together. Returns
    /// `true` when targets were reallocated and bind groups must be rebuilt.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.targets.resize(device, width, height) {
            return false;
        }
        self.camera.set_aspect(width, height);
        true
    }
}
