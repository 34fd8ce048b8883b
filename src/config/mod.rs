/// Process configuration loaded from the environment

pub mod settings;

pub use settings::{ConfigError, Credentials, Settings};
