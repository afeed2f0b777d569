use std::path::{Path, PathBuf};

const APP_DIR: &str = "speaking-clock";
const CONFIG_FILE: &str = "clock.toml";

pub fn get_config_path() -> Option<PathBuf> {
    ::dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

pub fn get_config_file<P: AsRef<Path>>(config: &Path, file: P) -> PathBuf {
    config.join(file)
}

/// Where the clock looks for its configuration when no `--config` is given.
pub fn default_config_file() -> Option<PathBuf> {
    get_config_path().map(|dir| get_config_file(&dir, CONFIG_FILE))
}
