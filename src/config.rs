use std::path::{Path, PathBuf};

/// Environment variable overriding [`LoadConfig::asset_dir`].
pub const ASSET_DIR_ENV: &str = "FLOW_SCENE_ASSET_DIR";

/// Settings for one model load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadConfig {
    /// Root that relative model paths are resolved against.
    pub asset_dir: PathBuf,
    /// glTF scene to load. `None` picks the default scene, else the first one.
    pub scene: Option<usize>,
    /// Prefix of every GPU buffer label.
    pub label: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            scene: None,
            label: "flow-scene".to_string(),
        }
    }
}

impl LoadConfig {
    /// Defaults, with the asset directory taken from `FLOW_SCENE_ASSET_DIR` if set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(ASSET_DIR_ENV) {
            Some(dir) if !dir.is_empty() => config.with_asset_dir(dir),
            _ => config,
        }
    }

    pub fn with_asset_dir(mut self, asset_dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = asset_dir.into();
        self
    }

    pub fn with_scene(mut self, scene: usize) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Resolves `file_name` against the asset directory. Absolute paths are kept.
    pub fn resolve(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(file_name)
    }
}
