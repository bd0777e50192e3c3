//! Composite selector: which buffer (or combination) the mixer writes to the screen.

/// Inspection modes of the mixer stage. The discriminant is the digit key
/// and the `mode` value the mixer shader switches on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CompositeMode {
    Occlusion = 0,
    OcclusionBlurred = 1,
    Lighting = 2,
    Indirect = 3,
    IndirectBlurred = 4,
    Skybox = 5,
    Combined = 6,
    Normals = 7,
    #[default]
    Final = 8,
    Depth = 9,
}

impl CompositeMode {
    pub const ALL: [CompositeMode; 10] = [
        Self::Occlusion,
        Self::OcclusionBlurred,
        Self::Lighting,
        Self::Indirect,
        Self::IndirectBlurred,
        Self::Skybox,
        Self::Combined,
        Self::Normals,
        Self::Final,
        Self::Depth,
    ];

    pub fn from_digit(digit: u32) -> Option<Self> {
        Self::ALL.get(digit as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Occlusion => "SSDO direct",
            Self::OcclusionBlurred => "SSDO direct (blurred)",
            Self::Lighting => "Phong lighting",
            Self::Indirect => "SSDO indirect",
            Self::IndirectBlurred => "SSDO indirect (blurred)",
            Self::Skybox => "skybox",
            Self::Combined => "direct + indirect",
            Self::Normals => "normals",
            Self::Final => "final",
            Self::Depth => "linear depth",
        }
    }
}

impl std::fmt::Display for CompositeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.index(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_mapping_round_trips() {
        for digit in 0..10 {
            let mode = CompositeMode::from_digit(digit).unwrap();
            assert_eq!(mode.index(), digit);
        }
        assert_eq!(CompositeMode::from_digit(10), None);
        assert_eq!(CompositeMode::default(), CompositeMode::Final);
    }
}
