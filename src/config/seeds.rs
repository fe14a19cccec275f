use crate::config::types::SeedConfig;
use crate::ConfigError;
use std::path::Path;

/// Collects the raw seed strings named by the `[seeds]` section
///
/// Inline URLs come first, followed by the lines of the seed file in order.
/// Blank lines and lines starting with `#` are skipped. Seeds are returned
/// unparsed; turning them into locations is the coordinator's job, which logs
/// and skips any it cannot parse.
pub fn load_seeds(config: &SeedConfig) -> Result<Vec<String>, ConfigError> {
    let mut seeds: Vec<String> = config.urls.clone();

    if let Some(path) = &config.path {
        seeds.extend(read_seed_file(Path::new(path))?);
    }

    Ok(seeds)
}

/// Reads one seed per line from a file
pub fn read_seed_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Seeds {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_seed_lines(&content))
}

fn parse_seed_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
