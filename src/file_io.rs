use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mindmap_core::{EngineConfig, Snapshot};

/// Load a record snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read from {:?}", path))?;
    Snapshot::from_json(&content).with_context(|| format!("Failed to parse snapshot {:?}", path))
}

/// Save a record snapshot as pretty JSON
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let content = snapshot.to_json()?;
    fs::write(path, content).with_context(|| format!("Failed to save to {:?}", path))?;
    Ok(())
}

/// Engine config from an optional JSON file; defaults when absent
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::default()),
    }
}

/// `input` with its extension swapped for `.svg`
pub fn default_svg_path(input: &Path) -> PathBuf {
    input.with_extension("svg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::{Direction, NodeRecord};

    #[test]
    fn snapshot_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        let snapshot = Snapshot::new()
            .with("r", NodeRecord::root("Root").with_children(["a"]))
            .with("a", NodeRecord::child("A", Direction::Left));

        save_snapshot(&snapshot, &path).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), snapshot);
    }

    #[test]
    fn hand_written_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(
            &path,
            r#"{ "r": { "label": "Root", "isRoot": true, "children": ["a"] },
                 "a": { "label": "A", "direction": "RIGHT" } }"#,
        )
        .unwrap();

        let snapshot = load_snapshot(&path).unwrap();
        let a = snapshot.get(&"a".into()).unwrap();
        assert!(a.is_expand);
        assert_eq!(a.direction, Some(Direction::Right));
        assert!(a.children.is_empty());
    }

    #[test]
    fn missing_files_report_the_path() {
        let err = load_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err}").contains("here.json"));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "touch_mode": true }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.touch_mode);
        assert_eq!(config.drag_threshold, 2.0);
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn svg_path_replaces_extension() {
        assert_eq!(default_svg_path(Path::new("maps/plan.json")), PathBuf::from("maps/plan.svg"));
    }
}
