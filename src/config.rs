use std::path::PathBuf;

use crate::model_loader::AssetFormat;
use crate::views::Sample;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    pub initial_sample: Sample,
    pub asset_root: PathBuf,
    pub model_path: PathBuf,
    pub model_format: AssetFormat,
    pub shader_folder: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "boxstage".to_string(),
            window_size: (1280, 720),
            initial_sample: Sample::Static,
            asset_root: PathBuf::from("assets"),
            model_path: PathBuf::from("models/scene.gltf"),
            model_format: AssetFormat::Gltf,
            shader_folder: PathBuf::from("src/shaders"),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `BOXSTAGE_SAMPLE`, `BOXSTAGE_ASSET_ROOT` and
    /// `BOXSTAGE_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(sample) = lookup("BOXSTAGE_SAMPLE") {
            match Sample::from_name(&sample) {
                Some(sample) => config.initial_sample = sample,
                None => log::warn!("Unknown sample {:?}, using {:?}", sample, config.initial_sample),
            }
        }

        if let Some(root) = lookup("BOXSTAGE_ASSET_ROOT") {
            config.asset_root = PathBuf::from(root);
        }

        if let Some(model) = lookup("BOXSTAGE_MODEL") {
            let path = PathBuf::from(model);
            match AssetFormat::from_path(&path) {
                Some(format) => config.model_format = format,
                None => log::warn!(
                    "Can't tell the format of {}, assuming {:?}",
                    path.display(),
                    config.model_format
                ),
            }
            config.model_path = path;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.initial_sample, Sample::Static);
        assert_eq!(config.model_format, AssetFormat::Gltf);
        assert_eq!(config.asset_root, PathBuf::from("assets"));
    }

    #[test]
    fn overrides_sample_and_model() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BOXSTAGE_SAMPLE", "model"),
            ("BOXSTAGE_ASSET_ROOT", "/data"),
            ("BOXSTAGE_MODEL", "robot.FBX"),
        ]));
        assert_eq!(config.initial_sample, Sample::Model);
        assert_eq!(config.asset_root, PathBuf::from("/data"));
        assert_eq!(config.model_path, PathBuf::from("robot.FBX"));
        assert_eq!(config.model_format, AssetFormat::Fbx);
    }

    #[test]
    fn unknown_sample_keeps_default() {
        let config = AppConfig::from_lookup(lookup(&[("BOXSTAGE_SAMPLE", "teapot")]));
        assert_eq!(config.initial_sample, Sample::Static);
    }
}
