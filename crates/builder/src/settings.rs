use std::path::{Path, PathBuf};

use anyhow::Context as _;
use editor::EditorConfig;

pub const CONFIG_ENV: &str = "AGENT_BUILDER_CONFIG";
pub const SAVE_ENV: &str = "AGENT_BUILDER_SAVE";
pub const DEFAULT_SAVE_PATH: &str = "agent-graph.json";

/// Startup settings gathered from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub editor: EditorConfig,
    pub save_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let save = std::env::var_os(SAVE_ENV).map(PathBuf::from);
        Self::resolve(config.as_deref(), save)
    }

    pub fn resolve(config_path: Option<&Path>, save_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let editor = match config_path {
            Some(path) => load_editor_config(path)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            editor,
            save_path: save_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_PATH)),
        })
    }
}

fn load_editor_config(path: &Path) -> anyhow::Result<EditorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read editor config {}", path.display()))?;
    let config: EditorConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse editor config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid editor config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded editor config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::resolve(None, None).unwrap();
        assert_eq!(settings.save_path, PathBuf::from("agent-graph.json"));
        assert_eq!(settings.editor.zoom.min_scale, 0.5);
    }

    #[test]
    fn partial_config_file_keeps_other_defaults() {
        let path = std::env::temp_dir().join(format!(
            "agent-builder-settings-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "port_radius": 12.0 }"#).unwrap();

        let settings = Settings::resolve(Some(&path), Some("out.json".into())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.editor.port_radius, 12.0);
        assert_eq!(settings.editor.click_slop, EditorConfig::default().click_slop);
        assert_eq!(settings.save_path, PathBuf::from("out.json"));
    }

    #[test]
    fn inverted_scale_bounds_are_refused() {
        let path = std::env::temp_dir().join(format!(
            "agent-builder-settings-inverted-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{ "zoom": { "min_scale": 2.0, "max_scale": 0.5 } }"#,
        )
        .unwrap();

        let err = Settings::resolve(Some(&path), None).unwrap_err();
        std::fs::remove_file(&path).ok();

        let message = format!("{err:#}");
        assert!(message.contains("invalid editor config"), "{message}");
        assert!(message.contains("larger than max_scale"), "{message}");
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let err = Settings::resolve(Some(Path::new("/nonexistent/editor.json")), None).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/editor.json"));
    }
}
