use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ssdo",
    about = "Screen-space directional occlusion viewer for OFF meshes",
    version
)]
pub struct Cli {
    /// Mesh to display (OFF format)
    #[arg(default_value = "resources/models/cube.off")]
    pub mesh: PathBuf,

    /// Directory holding the six skybox faces (right, left, top, bottom, back, front .jpg)
    #[arg(long, default_value = "resources/skybox")]
    pub skybox: PathBuf,

    /// Initial composite mode (0-9, same as the digit keys)
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub mode: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let cli = Cli::try_parse_from(["ssdo"]).unwrap();
        assert_eq!(cli.mesh, PathBuf::from("resources/models/cube.off"));
        assert_eq!(cli.skybox, PathBuf::from("resources/skybox"));
        assert_eq!(cli.mode, 8);
    }

    #[test]
    fn test_single_positional_is_mesh() {
        let cli = Cli::try_parse_from(["ssdo", "bunny.off"]).unwrap();
        assert_eq!(cli.mesh, PathBuf::from("bunny.off"));
    }

    #[test]
    fn test_two_positionals_rejected() {
        assert!(Cli::try_parse_from(["ssdo", "a.off", "b.off"]).is_err());
    }

    #[test]
    fn test_mode_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["ssdo", "--mode", "10"]).is_err());
        let cli = Cli::try_parse_from(["ssdo", "--mode", "0"]).unwrap();
        assert_eq!(cli.mode, 0);
    }
}
