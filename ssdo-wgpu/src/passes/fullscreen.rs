//! Full-screen stages: lighting, SSDO direct/indirect, blurs and the mixer.

use crate::graph::PassStage;
use crate::render_targets::RenderTargetRegistry;

/// Bind `stage`'s targets, then draw the vertex-index full-screen triangle.
/// `kernel_bg` goes to group 1 for the SSDO estimators.
pub fn render_fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    targets: &RenderTargetRegistry,
    stage: &PassStage,
    screen: &wgpu::TextureView,
    screen_clear: wgpu::Color,
    pipeline: &wgpu::RenderPipeline,
    stage_bg: &wgpu::BindGroup,
    kernel_bg: Option<&wgpu::BindGroup>,
) {
    let mut pass = targets.bind(encoder, stage, screen, screen_clear);

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, stage_bg, &[]);
    if let Some(kernel_bg) = kernel_bg {
        pass.set_bind_group(1, kernel_bg, &[]);
    }

    pass.draw(0..3, 0..1);
}
