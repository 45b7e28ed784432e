use std::{fs, path::Path};

use anyhow::{Context, Result};
use arena_waves_core::ArenaConfig;

/// Arena played when no file is supplied on the command line.
const DEFAULT_ARENA: &str = include_str!("../config/arena.toml");

/// Loads the arena at `path`, or the bundled default when `path` is absent.
pub(crate) fn load_arena(path: Option<&Path>) -> Result<ArenaConfig> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read arena file at {}", path.display()))?;
            parse_arena(&contents)
                .with_context(|| format!("failed to load arena file at {}", path.display()))
        }
        None => parse_arena(DEFAULT_ARENA).context("bundled arena file is invalid"),
    }
}

fn parse_arena(contents: &str) -> Result<ArenaConfig> {
    toml::from_str(contents).context("failed to parse arena toml contents")
}

#[cfg(test)]
mod tests {
    use arena_waves_core::{EntityCategory, KindId};

    use super::*;

    #[test]
    fn bundled_arena_parses() {
        let arena = load_arena(None).expect("bundled arena");
        assert_eq!(arena.waves.len(), 3);
        assert!(arena.loop_waves);
        assert_eq!(
            arena
                .kinds
                .iter()
                .find(|kind| kind.id == KindId::new(3))
                .map(|kind| kind.category),
            Some(EntityCategory::Projectile)
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_arena(Some(Path::new("does/not/exist.toml"))).expect_err("missing file");
        assert!(format!("{error:#}").contains("does/not/exist.toml"));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let error = parse_arena("seed = [").expect_err("malformed toml");
        assert!(format!("{error:#}").contains("failed to parse arena toml contents"));
    }
}
