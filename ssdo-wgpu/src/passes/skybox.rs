//! Skybox pass: environment cube drawn at the far plane into its own target.

use crate::graph::PassStage;
use crate::render_targets::{RenderTargetRegistry, SKYBOX_VERTEX_COUNT};

pub fn render_skybox_pass(
    encoder: &mut wgpu::CommandEncoder,
    targets: &RenderTargetRegistry,
    stage: &PassStage,
    screen: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    skybox_bg: &wgpu::BindGroup,
    cube_vbo: &wgpu::Buffer,
) {
    let mut pass = targets.bind(encoder, stage, screen, wgpu::Color::BLACK);

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, skybox_bg, &[]);
    pass.set_vertex_buffer(0, cube_vbo.slice(..));
    pass.draw(0..SKYBOX_VERTEX_COUNT, 0..1);
}
