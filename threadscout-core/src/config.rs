use crate::error::ConfigError;
use serde::Deserialize;
use std::env;

const DEFAULT_USER_AGENT: &str = "threadscout/0.1 by threadscout-bot";
const DEFAULT_PER_SOURCE_LIMIT: u32 = 25;

/// Credentials and run inputs for the collection engine. Tunables that
/// belong to individual components (retry budget, batch sizes, thresholds)
/// live next to those components in `reddit-client`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub subreddits: Vec<String>,
    pub per_source_limit: u32,
}

/// Optional TOML overlay. Credentials stay in the environment; the file only
/// carries the non-secret knobs.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    pub user_agent: Option<String>,
    pub subreddits: Option<Vec<String>>,
    pub per_source_limit: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = require_env("THREADSCOUT_CLIENT_ID")?;
        let client_secret = require_env("THREADSCOUT_CLIENT_SECRET")?;

        let user_agent =
            env::var("THREADSCOUT_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let subreddits = env::var("THREADSCOUT_SUBREDDITS")
            .map(|raw| parse_subreddit_list(&raw))
            .unwrap_or_default();

        let per_source_limit = match env::var("THREADSCOUT_POST_LIMIT") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                field: "THREADSCOUT_POST_LIMIT".to_string(),
                value: raw,
            })?,
            Err(_) => DEFAULT_PER_SOURCE_LIMIT,
        };

        Ok(Self {
            client_id,
            client_secret,
            user_agent,
            subreddits,
            per_source_limit,
        })
    }

    /// Layer a parsed TOML file over the environment-derived config.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(user_agent) = file.user_agent {
            self.user_agent = user_agent;
        }
        if let Some(subreddits) = file.subreddits {
            self.subreddits = subreddits;
        }
        if let Some(limit) = file.per_source_limit {
            self.per_source_limit = limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subreddits.is_empty() {
            return Err(ConfigError::MissingField {
                field: "subreddits".to_string(),
            });
        }
        if self.per_source_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "per_source_limit".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

impl FileConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

fn require_env(var_name: &str) -> Result<String, ConfigError> {
    env::var(var_name).map_err(|_| ConfigError::MissingEnvironmentVariable {
        var_name: var_name.to_string(),
    })
}

pub fn parse_subreddit_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches("r/").to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subreddit_list_parsing() {
        assert_eq!(
            parse_subreddit_list("rust, r/programming ,,golang"),
            vec!["rust", "programming", "golang"]
        );
        assert!(parse_subreddit_list("").is_empty());
    }

    #[test]
    fn file_config_overlay() {
        let mut config = AppConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            subreddits: vec!["rust".to_string()],
            per_source_limit: 25,
        };

        let file = FileConfig::from_toml_str(
            r#"
            subreddits = ["selfhosted", "homelab"]
            per_source_limit = 50
            "#,
        )
        .unwrap();

        config.apply_file(file);
        assert_eq!(config.subreddits, vec!["selfhosted", "homelab"]);
        assert_eq!(config.per_source_limit, 50);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let result = FileConfig::from_toml_str("subreddits = not-a-list");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn validation_rejects_empty_sources() {
        let config = AppConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            subreddits: vec![],
            per_source_limit: 25,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }
}
