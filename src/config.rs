// Configuration - defaults, then registry.toml, then the environment
//
// Later sources override earlier ones. Environment variables are prefixed
// with STUDENT_REGISTRY_ and use "__" between nested keys
// (STUDENT_REGISTRY_STORAGE__OUTPUT_DIR).

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "registry.toml";

const ENV_PREFIX: &str = "STUDENT_REGISTRY_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub institution: InstitutionConfig,
    pub choices: ChoiceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// CSV file holding every registration.
    pub registrations_path: PathBuf,
    /// Directory that receives rendered documents.
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstitutionConfig {
    /// Printed at the top of every document.
    pub name: String,
    /// Logo drawn next to the name; skipped when the file is missing.
    pub logo_path: PathBuf,
}

/// Suggestions offered by the combo inputs. Free text is still accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceConfig {
    pub cities: Vec<String>,
    pub states: Vec<String>,
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registrations_path: PathBuf::from("registrations.csv"),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            name: "YUG COMPUTER CENTER".to_string(),
            logo_path: PathBuf::from("college_logo.png"),
        }
    }
}

impl Default for ChoiceConfig {
    fn default() -> Self {
        Self {
            cities: to_strings(&[
                "Moradabad",
                "Lucknow",
                "Kanpur",
                "Varanasi",
                "Prayagraj",
                "Agra",
                "Meerut",
                "Noida",
                "Ghaziabad",
                "Bareilly",
            ]),
            states: to_strings(&[
                "Uttar Pradesh",
                "Maharashtra",
                "Delhi",
                "Punjab",
                "Haryana",
                "Madhya Pradesh",
                "Rajasthan",
                "Bihar",
            ]),
            courses: to_strings(&[
                "Basic Computer course",
                "Adobe Photoshop",
                "Corealdraw",
                "MS Office",
                "Typing",
                "Tally",
                "Python",
                "C Programming",
                "C++",
                "Java",
                "Web Development",
            ]),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Config {
    /// Load configuration from the default file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Check values that would make every operation fail.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidation` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.storage.registrations_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.registrations_path must not be empty".to_string(),
            });
        }
        if self.institution.name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "institution.name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn registrations_path(&self) -> &Path {
        &self.storage.registrations_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.storage.output_dir
    }
}
