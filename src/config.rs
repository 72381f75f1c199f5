use eyre::{Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::Category;
use crate::error::ResearchError;

/// Process-wide settings plus the ordered category registry.
///
/// Built once at startup and passed by reference; nothing reads it globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    #[serde(deserialize_with = "deserialize_categories", serialize_with = "serialize_categories")]
    pub categories: Vec<Category>,
    pub topics_per_category: usize,
    /// Values <= 0 still allow one attempt
    pub retry_max: i32,
    pub retry_interval_sec: u64,
    #[serde(alias = "claude_timeout_sec")]
    pub agent_timeout_sec: u64,
    #[serde(alias = "github_pages_base_url")]
    pub site_base_url: Option<String>,
    pub output_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub index_limit: usize,
    pub prompt_template: Option<String>,
    pub agent: AgentConfig,
    pub git: GitConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub command: String,
    pub allowed_tools: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            allowed_tools: vec!["WebSearch".to_string()],
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub repo_root: PathBuf,
    pub remote: String,
    pub branch: String,
    pub commit_prefix: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            commit_prefix: "Add daily report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Environment variable holding the webhook URL
    pub webhook_env: String,
    pub timeout_sec: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_env: "TEAMS_WEBHOOK_URL".to_string(),
            timeout_sec: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            categories: Vec::new(),
            topics_per_category: 5,
            retry_max: 3,
            retry_interval_sec: 1800,
            agent_timeout_sec: 600,
            site_base_url: None,
            output_dir: PathBuf::from("output"),
            logs_dir: PathBuf::from("logs"),
            template_dir: None,
            index_limit: 30,
            prompt_template: None,
            agent: AgentConfig::default(),
            git: GitConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize)]
struct CategoryFields {
    name: String,
    query: String,
}

/// Categories are a YAML mapping `id -> {name, query}`; document order is registry order.
fn deserialize_categories<'de, D>(deserializer: D) -> std::result::Result<Vec<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<Category>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of category id to {name, query}")
        }

        fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut categories = Vec::new();
            let mut seen = HashSet::new();
            while let Some((id, fields)) = map.next_entry::<String, CategoryFields>()? {
                if !seen.insert(id.clone()) {
                    return Err(de::Error::custom(format!("duplicate category id: {}", id)));
                }
                categories.push(Category::new(id, fields.name, fields.query));
            }
            Ok(categories)
        }
    }

    deserializer.deserialize_map(CategoriesVisitor)
}

fn serialize_categories<S>(categories: &[Category], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(categories.len()))?;
    for cat in categories {
        map.serialize_entry(
            &cat.id,
            &CategoryFields {
                name: cat.name.clone(),
                query: cat.query.clone(),
            },
        )?;
    }
    map.end()
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));
        candidates.push(PathBuf::from("config.yaml"));

        for candidate in candidates {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config = Self::from_yaml_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reject a registry the orchestrator cannot run.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.categories.is_empty() {
            return Err(ResearchError::Config("no categories configured".to_string()));
        }
        if self.topics_per_category == 0 {
            return Err(ResearchError::Config("topics_per_category must be at least 1".to_string()));
        }
        let mut seen = HashSet::new();
        for cat in &self.categories {
            if cat.id.trim().is_empty() {
                return Err(ResearchError::Config("category id must not be empty".to_string()));
            }
            if !seen.insert(cat.id.as_str()) {
                return Err(ResearchError::Config(format!("duplicate category id: {}", cat.id)));
            }
            if cat.query.trim().is_empty() {
                return Err(ResearchError::Config(format!("category '{}' has an empty query", cat.id)));
            }
        }
        Ok(())
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_sec)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
topics_per_category: 5
claude_timeout_sec: 300
retry_max: 2
retry_interval_sec: 60
github_pages_base_url: https://example.github.io/reports
categories:
  ai_tech:
    name: AI Technology
    query: latest AI model releases
  ai_security:
    name: AI Security
    query: AI security incidents
  ai_policy:
    name: AI Policy
    query: AI regulation news
"#;

    #[test]
    fn test_parse_preserves_category_order() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let ids: Vec<&str> = config.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ai_tech", "ai_security", "ai_policy"]);
        assert_eq!(config.categories[1].name, "AI Security");
    }

    #[test]
    fn test_parse_aliases() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.agent_timeout(), Duration::from_secs(300));
        assert_eq!(config.site_base_url.as_deref(), Some("https://example.github.io/reports"));
        assert_eq!(config.retry_max, 2);
        assert_eq!(config.retry_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::from_yaml_str("categories:\n  a:\n    name: A\n    query: q\n").unwrap();
        assert_eq!(config.topics_per_category, 5);
        assert_eq!(config.retry_max, 3);
        assert_eq!(config.agent.command, "claude");
        assert_eq!(config.git.remote, "origin");
        assert_eq!(config.notify.webhook_env, "TEAMS_WEBHOOK_URL");
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_registry() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("no categories"));
    }

    #[test]
    fn test_validate_rejects_zero_topics() {
        let mut config = Config::from_yaml_str(SAMPLE).unwrap();
        config.topics_per_category = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut config = Config::from_yaml_str(SAMPLE).unwrap();
        config.categories.push(Category::new("ai_tech", "Again", "q"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate category id: ai_tech"));
    }

    #[test]
    fn test_validate_rejects_empty_query() {
        let mut config = Config::from_yaml_str(SAMPLE).unwrap();
        config.categories[0].query = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_category_lookup() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.category("ai_policy").map(|c| c.name.as_str()), Some("AI Policy"));
        assert!(config.category("missing").is_none());
    }

    #[test]
    fn test_serialize_roundtrip_keeps_order() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reparsed = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(reparsed.categories, config.categories);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("daily-research.yml");
        fs::write(&path, SAMPLE).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.categories.len(), 3);
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let path = PathBuf::from("/nonexistent/daily-research.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
