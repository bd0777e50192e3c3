//! Geometry pass: every scene object into the G-buffer MRTs.

use crate::graph::PassStage;
use crate::render_targets::RenderTargetRegistry;
use crate::scene::SceneObject;

pub fn render_geometry_pass(
    encoder: &mut wgpu::CommandEncoder,
    targets: &RenderTargetRegistry,
    stage: &PassStage,
    screen: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    frame_bg: &wgpu::BindGroup,
    objects: &[SceneObject],
) {
    let mut pass = targets.bind(encoder, stage, screen, wgpu::Color::BLACK);

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, frame_bg, &[]);

    // Empty buffers cannot be sliced.
    for object in objects.iter().filter(|o| o.mesh.index_count > 0) {
        pass.set_bind_group(1, &object.bind_group, &[]);
        pass.set_vertex_buffer(0, object.mesh.position_buffer.slice(..));
        pass.set_vertex_buffer(1, object.mesh.normal_buffer.slice(..));
        pass.set_index_buffer(object.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..object.mesh.index_count, 0, 0..1);
    }
}
