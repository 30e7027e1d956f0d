use crate::domain::DonorTag;
use crate::sources::Platform;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use telemetry::TelemetrySettings;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub sources: SourceSettings,
    pub mailchimp: MailchimpSettings,
    #[serde(default)]
    pub tags: TagLabels,
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub data_directory: PathBuf,
    #[serde(default = "default_archive_folder")]
    pub archive_folder: String,
    pub debug_directory: PathBuf,
    #[serde(default)]
    pub diagnostic_mode: bool,
}

fn default_archive_folder() -> String {
    "processed".to_string()
}

#[derive(Deserialize, Clone)]
pub struct SourceSettings {
    pub fundraisingbox: bool,
    pub twingle: bool,
}

impl SourceSettings {
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|platform| match platform {
                Platform::FundraisingBox => self.fundraisingbox,
                Platform::Twingle => self.twingle,
            })
            .collect()
    }
}

#[derive(Deserialize, Clone)]
pub struct MailchimpSettings {
    /// Data center prefix, e.g. `us21`.
    pub server: String,
    pub api_key: Secret<String>,
    pub list_id: String,
    pub timeout_milliseconds: u64,
    /// Overrides the URL derived from `server`.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl MailchimpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn api_base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.mailchimp.com/3.0", self.server),
        }
    }
}

/// Labels the mailing list shows for each donor tag.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TagLabels {
    pub one_time: String,
    pub recurring: String,
}

impl Default for TagLabels {
    fn default() -> Self {
        Self {
            one_time: DonorTag::OneTime.default_label().to_string(),
            recurring: DonorTag::Recurring.default_label().to_string(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {e}"))
    })?;

    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let environment_filename = format!("{}.yaml", environment.as_str());

    // Init configuration reader
    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_MAILCHIMP__API_KEY=abc-us21 would set `Settings.mailchimp.api_key`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a support environment. Use either local or production",
                other
            )),
        }
    }
}
