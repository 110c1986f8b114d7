use crate::widget::WidgetConfig;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub widget: WidgetConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_restart_attempts")]
    pub max_restart_attempts: u32,

    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

fn default_language() -> String {
    "nl-NL".to_string()
}

fn default_max_restart_attempts() -> u32 {
    3
}

fn default_restart_delay_ms() -> u64 {
    1000
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
