//! Declared pass graph: the eight stages, what each reads and writes, in
//! execution order. The frame driver walks `STAGES` front to back.

use thiserror::Error;

use crate::render_targets::TargetId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageId {
    Geometry,
    Lighting,
    SsdoDirect,
    DirectBlur,
    SsdoIndirect,
    IndirectBlur,
    Skybox,
    Mixer,
}

/// Where a texture input comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// An offscreen target written earlier in the frame.
    Target(TargetId),
    /// The rotation-noise tile (written once at initialisation).
    Noise,
    /// The environment cubemap (loaded once at initialisation).
    Environment,
}

/// A read binding. `unit` is the bind-group slot the shader declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureInput {
    pub unit: u32,
    pub source: InputSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    Target(TargetId),
    /// The visible framebuffer (surface texture or caller-supplied view).
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    /// Every scene object, indexed.
    SceneMesh,
    /// Single vertex-index triangle covering the viewport.
    FullscreenTriangle,
    /// 36-vertex unit cube.
    SkyboxCube,
}

#[derive(Clone, Copy, Debug)]
pub struct PassStage {
    pub id: StageId,
    pub name: &'static str,
    pub inputs: &'static [TextureInput],
    pub outputs: &'static [Attachment],
    pub depth: Option<TargetId>,
    pub draw: DrawKind,
    /// Whether the stage binds the sample-kernel group at index 1.
    pub uses_kernel: bool,
}

impl PassStage {
    pub fn reads(&self, target: TargetId) -> bool {
        self.inputs
            .iter()
            .any(|i| i.source == InputSource::Target(target))
    }

    pub fn writes(&self, target: TargetId) -> bool {
        self.outputs.contains(&Attachment::Target(target)) || self.depth == Some(target)
    }
}

const fn input(unit: u32, target: TargetId) -> TextureInput {
    TextureInput {
        unit,
        source: InputSource::Target(target),
    }
}

pub static STAGES: [PassStage; 8] = [
    PassStage {
        id: StageId::Geometry,
        name: "Geometry",
        inputs: &[],
        outputs: &[
            Attachment::Target(TargetId::PositionDepth),
            Attachment::Target(TargetId::Normal),
            Attachment::Target(TargetId::Albedo),
        ],
        depth: Some(TargetId::GeometryDepth),
        draw: DrawKind::SceneMesh,
        uses_kernel: false,
    },
    PassStage {
        id: StageId::Lighting,
        name: "Lighting",
        inputs: &[
            input(1, TargetId::PositionDepth),
            input(2, TargetId::Normal),
            input(3, TargetId::Albedo),
        ],
        outputs: &[Attachment::Target(TargetId::Lighting)],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: false,
    },
    PassStage {
        id: StageId::SsdoDirect,
        name: "SSDO Direct",
        inputs: &[
            input(1, TargetId::PositionDepth),
            input(2, TargetId::Normal),
            TextureInput { unit: 3, source: InputSource::Noise },
            TextureInput { unit: 4, source: InputSource::Environment },
        ],
        outputs: &[Attachment::Target(TargetId::Direct)],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: true,
    },
    PassStage {
        id: StageId::DirectBlur,
        name: "SSDO Direct Blur",
        inputs: &[input(1, TargetId::Direct)],
        outputs: &[Attachment::Target(TargetId::DirectBlur)],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: false,
    },
    PassStage {
        id: StageId::SsdoIndirect,
        name: "SSDO Indirect",
        inputs: &[
            input(1, TargetId::PositionDepth),
            input(2, TargetId::Normal),
            TextureInput { unit: 3, source: InputSource::Noise },
            input(4, TargetId::Lighting),
        ],
        outputs: &[Attachment::Target(TargetId::Indirect)],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: true,
    },
    PassStage {
        id: StageId::IndirectBlur,
        name: "SSDO Indirect Blur",
        inputs: &[input(1, TargetId::Indirect)],
        outputs: &[Attachment::Target(TargetId::IndirectBlur)],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: false,
    },
    PassStage {
        id: StageId::Skybox,
        name: "Skybox",
        inputs: &[TextureInput { unit: 1, source: InputSource::Environment }],
        outputs: &[Attachment::Target(TargetId::Skybox)],
        depth: Some(TargetId::SkyboxDepth),
        draw: DrawKind::SkyboxCube,
        uses_kernel: false,
    },
    PassStage {
        id: StageId::Mixer,
        name: "Mixer",
        inputs: &[
            input(1, TargetId::PositionDepth),
            input(2, TargetId::Normal),
            input(3, TargetId::Direct),
            input(4, TargetId::DirectBlur),
            input(5, TargetId::Lighting),
            input(6, TargetId::Indirect),
            input(7, TargetId::IndirectBlur),
            input(8, TargetId::Skybox),
        ],
        outputs: &[Attachment::Screen],
        depth: None,
        draw: DrawKind::FullscreenTriangle,
        uses_kernel: false,
    },
];

pub fn stage(id: StageId) -> &'static PassStage {
    // STAGES is declared in StageId order.
    &STAGES[id as usize]
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("stage {stage} reads {target:?} before {producer} writes it")]
    ForwardReference {
        stage: &'static str,
        target: TargetId,
        producer: &'static str,
    },
    #[error("stage {stage} reads {target:?}, which no stage writes")]
    NeverProduced { stage: &'static str, target: TargetId },
    #[error("{target:?} is written by both {first} and {second}")]
    WrittenTwice {
        target: TargetId,
        first: &'static str,
        second: &'static str,
    },
    #[error("stage {stage} has no output attachment")]
    NoOutputs { stage: &'static str },
    #[error("stage {stage}: input units must be 1..={count} in order, found {unit} at position {position}")]
    UnitOrder {
        stage: &'static str,
        count: usize,
        unit: u32,
        position: usize,
    },
}

/// Index of the stage that writes `target`, if any.
pub fn producer(stages: &[PassStage], target: TargetId) -> Option<usize> {
    stages.iter().position(|s| s.writes(target))
}

/// Checks ordering and single-writer invariants of a stage list.
pub fn validate(stages: &[PassStage]) -> Result<(), GraphError> {
    let mut writers: Vec<(TargetId, &'static str)> = Vec::new();
    for s in stages {
        if s.outputs.is_empty() && s.depth.is_none() {
            return Err(GraphError::NoOutputs { stage: s.name });
        }
        let written = s
            .outputs
            .iter()
            .filter_map(|a| match a {
                Attachment::Target(t) => Some(*t),
                Attachment::Screen => None,
            })
            .chain(s.depth);
        for target in written {
            if let Some(&(_, first)) = writers.iter().find(|(t, _)| *t == target) {
                return Err(GraphError::WrittenTwice {
                    target,
                    first,
                    second: s.name,
                });
            }
            writers.push((target, s.name));
        }
    }

    for (n, s) in stages.iter().enumerate() {
        for (position, inp) in s.inputs.iter().enumerate() {
            if inp.unit as usize != position + 1 {
                return Err(GraphError::UnitOrder {
                    stage: s.name,
                    count: s.inputs.len(),
                    unit: inp.unit,
                    position,
                });
            }
            let InputSource::Target(target) = inp.source else {
                continue;
            };
            match producer(stages, target) {
                None => return Err(GraphError::NeverProduced { stage: s.name, target }),
                Some(p) if p >= n => {
                    return Err(GraphError::ForwardReference {
                        stage: s.name,
                        target,
                        producer: stages[p].name,
                    })
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(id: StageId) -> usize {
        STAGES.iter().position(|s| s.id == id).unwrap()
    }

    #[test]
    fn test_declared_graph_is_valid() {
        validate(&STAGES).unwrap();
    }

    #[test]
    fn test_stage_order_and_lookup() {
        let order: Vec<StageId> = STAGES.iter().map(|s| s.id).collect();
        assert_eq!(
            order,
            vec![
                StageId::Geometry,
                StageId::Lighting,
                StageId::SsdoDirect,
                StageId::DirectBlur,
                StageId::SsdoIndirect,
                StageId::IndirectBlur,
                StageId::Skybox,
                StageId::Mixer,
            ]
        );
        for s in &STAGES {
            assert_eq!(stage(s.id).id, s.id);
        }
    }

    #[test]
    fn test_inputs_only_reference_earlier_stages() {
        for (n, s) in STAGES.iter().enumerate() {
            for inp in s.inputs {
                if let InputSource::Target(t) = inp.source {
                    let p = producer(&STAGES, t).unwrap();
                    assert!(p < n, "{} reads {:?} from later stage", s.name, t);
                }
            }
        }
    }

    #[test]
    fn test_indirect_reads_lighting_never_the_reverse() {
        let indirect = stage(StageId::SsdoIndirect);
        let lighting = stage(StageId::Lighting);
        assert!(indirect.reads(TargetId::Lighting));
        assert!(!lighting.reads(TargetId::Indirect));
        assert!(index_of(StageId::Lighting) < index_of(StageId::SsdoIndirect));
    }

    #[test]
    fn test_mixer_reads_every_intermediate() {
        let mixer = stage(StageId::Mixer);
        for t in [
            TargetId::PositionDepth,
            TargetId::Normal,
            TargetId::Direct,
            TargetId::DirectBlur,
            TargetId::Lighting,
            TargetId::Indirect,
            TargetId::IndirectBlur,
            TargetId::Skybox,
        ] {
            assert!(mixer.reads(t), "mixer misses {t:?}");
        }
        assert_eq!(mixer.outputs, &[Attachment::Screen]);
    }

    #[test]
    fn test_forward_reference_detected() {
        let mut stages = STAGES.to_vec();
        stages.swap(index_of(StageId::Lighting), index_of(StageId::SsdoIndirect));
        let err = validate(&stages).unwrap_err();
        assert_eq!(
            err,
            GraphError::ForwardReference {
                stage: "SSDO Indirect",
                target: TargetId::Lighting,
                producer: "Lighting",
            }
        );
    }

    #[test]
    fn test_double_write_detected() {
        let mut stages = STAGES.to_vec();
        stages[index_of(StageId::IndirectBlur)].outputs = &[Attachment::Target(TargetId::DirectBlur)];
        assert!(matches!(
            validate(&stages),
            Err(GraphError::WrittenTwice { target: TargetId::DirectBlur, .. })
        ));
    }

    #[test]
    fn test_missing_producer_detected() {
        let stages: Vec<PassStage> = STAGES
            .iter()
            .filter(|s| s.id != StageId::Skybox)
            .copied()
            .collect();
        assert!(matches!(
            validate(&stages),
            Err(GraphError::NeverProduced { target: TargetId::Skybox, .. })
        ));
    }

    #[test]
    fn test_unit_gap_detected() {
        let mut stages = STAGES.to_vec();
        stages[index_of(StageId::DirectBlur)].inputs = &[TextureInput {
            unit: 2,
            source: InputSource::Target(TargetId::Direct),
        }];
        assert!(matches!(validate(&stages), Err(GraphError::UnitOrder { unit: 2, .. })));
    }
}
