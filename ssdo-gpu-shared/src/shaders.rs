//! Embedded WGSL shader source strings for the SSDO pass pipeline.
//! Binding slots follow the pass graph: slot 0 is the stage's uniform block,
//! texture inputs follow in unit order, then the nearest and linear samplers.

pub const FULLSCREEN_QUAD_VERT: &str = include_str!("../shaders/fullscreen_quad.wgsl");
pub const GEOMETRY_SHADER: &str = include_str!("../shaders/geometry.wgsl");
pub const LIGHTING_FRAG: &str = include_str!("../shaders/lighting.wgsl");
pub const SSDO_DIRECT_FRAG: &str = include_str!("../shaders/ssdo_direct.wgsl");
pub const SSDO_INDIRECT_FRAG: &str = include_str!("../shaders/ssdo_indirect.wgsl");
pub const BLUR_FRAG: &str = include_str!("../shaders/blur.wgsl");
pub const SKYBOX_SHADER: &str = include_str!("../shaders/skybox.wgsl");
pub const MIXER_FRAG: &str = include_str!("../shaders/mixer.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(label: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{label}: {e:?}"));
    }

    #[test]
    fn test_all_shaders_validate() {
        for (label, source) in [
            ("fullscreen_quad", FULLSCREEN_QUAD_VERT),
            ("geometry", GEOMETRY_SHADER),
            ("lighting", LIGHTING_FRAG),
            ("ssdo_direct", SSDO_DIRECT_FRAG),
            ("ssdo_indirect", SSDO_INDIRECT_FRAG),
            ("blur", BLUR_FRAG),
            ("skybox", SKYBOX_SHADER),
            ("mixer", MIXER_FRAG),
        ] {
            validate(label, source);
        }
    }

    #[test]
    fn test_kernel_capacity_matches_uniforms() {
        let decl = format!("array<vec4<f32>, {}>", crate::uniforms::MAX_KERNEL_SIZE);
        assert!(SSDO_DIRECT_FRAG.contains(&decl));
        assert!(SSDO_INDIRECT_FRAG.contains(&decl));
    }
}
