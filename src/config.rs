use crate::assertion::{AssertionCompiler, ConfigurationError};
use crate::capture::CapturedError;
use crate::filter::{FilterPipeline, load_rules};
use crate::notify::{LogNotifier, MailDropNotifier, Notifier};
use crate::store::{ErrorStore, FileStore, MemoryStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    /// Application name stamped on captured errors that carry none
    pub application: String,
    /// Host name stamped on captured errors that carry none
    pub host: String,
    /// Rule document compiled into the filter pipeline
    pub rules: Option<PathBuf>,
    pub store: StoreConfig,
    pub notifiers: Vec<NotifierConfig>,
    pub query: QueryConfig,
    /// Fallback log filter when neither `RUST_LOG` nor `-v` is given
    pub log_level: Option<String>,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            application: "default".to_string(),
            host: default_host(),
            rules: None,
            store: StoreConfig::default(),
            notifiers: vec![NotifierConfig::Log { name: None }],
            query: QueryConfig::default(),
            log_level: None,
        }
    }
}

fn default_host() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StoreConfig {
    Memory {
        #[serde(default)]
        capacity: Option<usize>,
    },
    File {
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory { capacity: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NotifierConfig {
    Log {
        #[serde(default)]
        name: Option<String>,
    },
    MailDrop {
        #[serde(default)]
        name: Option<String>,
        directory: PathBuf,
        from: String,
        to: String,
        #[serde(default)]
        subject_prefix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { page_size: 15 }
    }
}

impl SieveConfig {
    pub fn build_store(&self) -> Result<Arc<dyn ErrorStore>, StoreError> {
        Ok(match &self.store {
            StoreConfig::Memory { capacity: None } => Arc::new(MemoryStore::new()),
            StoreConfig::Memory {
                capacity: Some(capacity),
            } => Arc::new(MemoryStore::bounded(*capacity)),
            StoreConfig::File { path } => Arc::new(FileStore::open(path)?),
        })
    }

    pub fn build_notifiers(&self) -> Vec<Arc<dyn Notifier>> {
        self.notifiers
            .iter()
            .map(|cfg| -> Arc<dyn Notifier> {
                match cfg {
                    NotifierConfig::Log { name } => match name {
                        Some(name) => Arc::new(LogNotifier::named(name)),
                        None => Arc::new(LogNotifier::new()),
                    },
                    NotifierConfig::MailDrop {
                        name,
                        directory,
                        from,
                        to,
                        subject_prefix,
                    } => {
                        let mut notifier = MailDropNotifier::new(directory, from, to)
                            .with_subject_prefix(subject_prefix);
                        if let Some(name) = name {
                            notifier = notifier.with_name(name);
                        }
                        Arc::new(notifier)
                    }
                }
            })
            .collect()
    }

    /// Compile the configured rule document; no document means an empty pipeline
    pub fn build_pipeline(
        &self,
        compiler: &AssertionCompiler,
    ) -> Result<FilterPipeline, ConfigurationError> {
        match &self.rules {
            Some(path) => Ok(FilterPipeline::new(load_rules(path, compiler)?)),
            None => Ok(FilterPipeline::default()),
        }
    }

    /// Fill in host and application when the captured error carries none
    pub fn stamp(&self, mut error: CapturedError) -> CapturedError {
        if error.host.is_empty() {
            error.host = self.host.clone();
        }
        if error.application.is_empty() {
            error.application = self.application.clone();
        }
        error
    }
}

pub fn load_config(path: Option<&Path>) -> Result<SieveConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<SieveConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<SieveConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static SieveConfig {
    static DEFAULT_CONFIG: LazyLock<SieveConfig> = LazyLock::new(SieveConfig::default);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = default_config();
        assert_eq!(cfg.query.page_size, 15);
        assert_eq!(cfg.store, StoreConfig::Memory { capacity: None });
        assert_eq!(cfg.build_notifiers().len(), 1);
        assert_eq!(cfg.build_notifiers()[0].name(), "log");
    }

    #[test]
    fn test_parse_full_config() {
        let cfg: SieveConfig = toml::from_str(
            r#"
application = "shop"
host = "web-01"
rules = "rules.json5"
log_level = "debug"

[store]
kind = "file"
path = "/var/lib/shop/errors.jsonl"

[[notifiers]]
kind = "log"

[[notifiers]]
kind = "mail-drop"
directory = "/var/spool/pickup"
from = "faults@shop"
to = "ops@shop"
subject_prefix = "[shop] "

[query]
page_size = 50
"#,
        )
        .unwrap();

        assert_eq!(cfg.application, "shop");
        assert_eq!(cfg.rules.as_deref(), Some(Path::new("rules.json5")));
        assert!(matches!(cfg.store, StoreConfig::File { .. }));
        assert_eq!(cfg.query.page_size, 50);

        let names: Vec<String> = cfg
            .build_notifiers()
            .iter()
            .map(|n| n.name().to_string())
            .collect();
        assert_eq!(names, vec!["log", "email"]);
    }

    #[test]
    fn test_missing_sections_fall_back() {
        let cfg: SieveConfig = toml::from_str("application = \"api\"").unwrap();
        assert_eq!(cfg.query.page_size, 15);
        assert_eq!(cfg.notifiers.len(), 1);
    }

    #[test]
    fn test_stamp_keeps_existing_values() {
        use crate::capture::ExceptionInfo;

        let cfg: SieveConfig = toml::from_str("application = \"api\"\nhost = \"h1\"").unwrap();
        let stamped = cfg.stamp(CapturedError::new(ExceptionInfo::new("E", "m")).with_host("h9"));
        assert_eq!(stamped.host, "h9");
        assert_eq!(stamped.application, "api");
    }
}
