mod load;
mod settings;
mod types;

pub use load::{apply_env_overrides, get_winsweep_data_dir, load_default, load_file};
pub use settings::{SelectionSettings, SETTINGS_FILE};
pub use types::{AppConfig, LoggingConfig, ProcessGateConfig, RunConfig};
