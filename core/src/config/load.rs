use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default winsweep data directory: ~/.winsweep
pub fn get_winsweep_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".winsweep"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.winsweep/config.toml (highest)
    let data_dir = get_winsweep_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if user_config.exists() {
        load_file(&user_config)?
    } else if local_config.exists() {
        load_file(local_config)?
    } else {
        AppConfig::default()
    };

    // Update logging directory to use the data directory if not set
    if cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |name| std::env::var(name).ok());
    Ok(cfg)
}

pub fn load_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))
}

/// Environment variable overrides (Priority 0: highest). Blank or unparsable
/// values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("WINSWEEP_VOLUME_ROOT") {
        cfg.run.volume_root = Some(v.trim().to_string());
    }
    if let Some(v) = get("WINSWEEP_TASK_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => cfg.run.task_timeout_secs = secs,
            _ => tracing::warn!(value = %v, "ignoring WINSWEEP_TASK_TIMEOUT_SECS"),
        }
    }
    if let Some(v) = get("WINSWEEP_LOG_LEVEL") {
        cfg.logging.level = v.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("WINSWEEP_VOLUME_ROOT", "E:\\"),
                ("WINSWEEP_TASK_TIMEOUT_SECS", " 30 "),
                ("WINSWEEP_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(cfg.run.volume_root.as_deref(), Some("E:\\"));
        assert_eq!(cfg.run.task_timeout_secs, 30);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("WINSWEEP_VOLUME_ROOT", "   "),
                ("WINSWEEP_TASK_TIMEOUT_SECS", "soon"),
            ]),
        );
        assert_eq!(cfg.run.volume_root, None);
        assert_eq!(cfg.run.task_timeout_secs, 900);
    }

    #[test]
    fn test_load_file_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[run]\ntask_timeout_secs = \"x\"\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
