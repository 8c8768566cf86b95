// Configuration loading

pub mod settings;

pub use settings::{
    CompareSettings, ConfigError, LogSettings, MasterSettings, PublishSettings, Settings,
    LOCAL_CONFIG_FILE,
};
