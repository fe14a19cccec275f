use crate::config::types::{
    Config, CrawlerConfig, ExtractorConfig, OutputConfig, ScopeConfig, SeedConfig,
    UserAgentConfig,
};
use crate::url::LocationId;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seed_config(&config.seeds)?;
    validate_scope_config(&config.scope)?;
    validate_extractor_config(&config.extractor)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be >= 1s, got {}s",
            config.fetch_timeout
        )));
    }

    // A day between requests is certainly a typo for milliseconds vs seconds
    if config.min_request_interval > 86_400_000 {
        return Err(ConfigError::Validation(format!(
            "min_request_interval must be <= 86400000ms, got {}ms",
            config.min_request_interval
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_seed_config(config: &SeedConfig) -> Result<(), ConfigError> {
    if matches!(&config.path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "seeds.path cannot be empty when set".to_string(),
        ));
    }

    for seed in &config.urls {
        LocationId::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }

    Ok(())
}

fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if !config.article_prefix.is_empty() && !config.article_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "article_prefix must start with '/', got '{}'",
            config.article_prefix
        )));
    }

    for namespace in &config.excluded_namespaces {
        if namespace.is_empty() || namespace.contains(':') || namespace.contains('/') {
            return Err(ConfigError::Validation(format!(
                "Invalid excluded namespace '{}': expected a bare name like 'Talk'",
                namespace
            )));
        }
    }

    for pattern in &config.domains {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.title_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "title_selectors cannot be empty".to_string(),
        ));
    }

    if config.body_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "body_selectors cannot be empty".to_string(),
        ));
    }

    for selector in config
        .title_selectors
        .iter()
        .chain(config.body_selectors.iter())
    {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e))
        })?;
    }

    Ok(())
}

/// Validates a domain pattern (supports a leading `*.` wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}' is empty",
            pattern
        )));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' has a misplaced '.' or '-'",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}
