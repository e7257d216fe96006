//! TOML editor configuration.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use clearway_core::{CellCoord, GridConfig, DEFAULT_GRID_SIDE, DEFAULT_MAX_CLEARANCE};
use serde::Deserialize;

/// Settings read from the `--config` file. Every section is optional.
///
/// ```toml
/// [grid]
/// side = 128
/// max_clearance = 15
///
/// [mover]
/// start = [0, 0]
/// size = 1
///
/// [path]
/// goal = [16, 16]
/// max_reach = 0
/// max_distance = 0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EditorConfig {
    pub(crate) grid: GridSection,
    pub(crate) mover: MoverSection,
    pub(crate) path: PathSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) side: u32,
    pub(crate) max_clearance: u8,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            side: DEFAULT_GRID_SIDE,
            max_clearance: DEFAULT_MAX_CLEARANCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MoverSection {
    pub(crate) start: [i32; 2],
    pub(crate) size: u8,
}

impl Default for MoverSection {
    fn default() -> Self {
        Self {
            start: [0, 0],
            size: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PathSection {
    pub(crate) goal: [i32; 2],
    pub(crate) max_reach: u32,
    pub(crate) max_distance: u32,
}

impl Default for PathSection {
    fn default() -> Self {
        Self {
            goal: [16, 16],
            max_reach: 0,
            max_distance: 0,
        }
    }
}

impl EditorConfig {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse config toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.grid_config()
            .validate()
            .context("[grid] section is not usable")?;

        let size = self.mover.size;
        if size == 0 || size > self.grid.max_clearance {
            bail!(
                "[mover] size {size} must lie between 1 and max_clearance {}",
                self.grid.max_clearance
            );
        }
        Ok(())
    }

    pub(crate) fn grid_config(&self) -> GridConfig {
        GridConfig::new(self.grid.side, self.grid.max_clearance)
    }

    pub(crate) fn mover_start(&self) -> CellCoord {
        CellCoord::new(self.mover.start[0], self.mover.start[1])
    }

    pub(crate) fn goal(&self) -> CellCoord {
        CellCoord::new(self.path.goal[0], self.path.goal[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = EditorConfig::parse("").expect("empty config parses");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.grid_config(), GridConfig::default());
        assert_eq!(config.goal(), CellCoord::new(16, 16));
    }

    #[test]
    fn sections_override_defaults() {
        let config = EditorConfig::parse(
            r#"
            [grid]
            side = 64
            max_clearance = 8

            [mover]
            start = [3, 4]
            size = 2

            [path]
            goal = [60, 10]
            max_reach = 12
            "#,
        )
        .expect("config parses");

        assert_eq!(config.grid_config(), GridConfig::new(64, 8));
        assert_eq!(config.mover_start(), CellCoord::new(3, 4));
        assert_eq!(config.mover.size, 2);
        assert_eq!(config.goal(), CellCoord::new(60, 10));
        assert_eq!(config.path.max_reach, 12);
        assert_eq!(config.path.max_distance, 0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = EditorConfig::parse("[grid]\nwidth = 10\n").expect_err("unknown key");
        assert!(format!("{error:#}").contains("width"));
    }

    #[test]
    fn invalid_grid_is_rejected() {
        assert!(EditorConfig::parse("[grid]\nside = 0\n").is_err());
        assert!(EditorConfig::parse("[grid]\nmax_clearance = 0\n").is_err());
    }

    #[test]
    fn mover_size_must_fit_clearance_range() {
        let error = EditorConfig::parse("[grid]\nmax_clearance = 4\n[mover]\nsize = 5\n")
            .expect_err("oversized mover");
        assert!(error.to_string().contains("size 5"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = EditorConfig::load(dir.path().join("absent.toml")).expect_err("missing");
        assert!(error.to_string().contains("failed to read config"));
    }
}
