//! Feature-file assembly and persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;
use url::Url;

use crate::scenario::Category;
use crate::Result;

/// Join scenarios under a `Feature:` header for the page's domain.
pub fn assemble_feature(source_url: &str, scenarios: &[String]) -> String {
    format!(
        "Feature: Automated tests for {}\n\n{}\n",
        domain(source_url),
        scenarios.join("\n\n")
    )
}

/// Where finished feature files go.
pub trait FeaturePersister {
    fn persist(&self, source_url: &str, feature_text: &str, category: Category) -> Result<PathBuf>;
}

/// Writes feature files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FsPersister {
    dir: PathBuf,
}

impl FsPersister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{domain}__{category}__{YYYYmmdd_HHMMSS}.feature`
    pub fn file_name(source_url: &str, category: Category, at: DateTime<Local>) -> String {
        format!(
            "{}__{}__{}.feature",
            domain(source_url).replace('.', "_"),
            category,
            at.format("%Y%m%d_%H%M%S")
        )
    }
}

impl FeaturePersister for FsPersister {
    fn persist(&self, source_url: &str, feature_text: &str, category: Category) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(Self::file_name(source_url, category, Local::now()));
        fs::write(&path, feature_text)?;
        info!("wrote {} feature to {}", category, path.display());
        Ok(path)
    }
}

/// Host and port of `url`, filesystem-safe. `unknown` when there is no host.
fn domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "unknown".into();
    };
    let Some(host) = parsed.host_str() else {
        return "unknown".into();
    };
    let raw = match parsed.port() {
        Some(port) => format!("{host}_{port}"),
        None => host.to_string(),
    };
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assemble_feature() {
        let text = assemble_feature(
            "https://www.example.com/shop",
            &["  Scenario: A".to_string(), "  Scenario: B".to_string()],
        );
        assert_eq!(
            text,
            "Feature: Automated tests for www.example.com\n\n  Scenario: A\n\n  Scenario: B\n"
        );
    }

    #[test]
    fn test_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            FsPersister::file_name("https://www.example.com/a?b=c", Category::Hover, at),
            "www_example_com__hover__20240309_140507.feature"
        );
        assert_eq!(
            FsPersister::file_name("http://localhost:8080/", Category::Popup, at),
            "localhost_8080__popup__20240309_140507.feature"
        );
    }

    #[test]
    fn test_domain_fallback() {
        assert_eq!(domain("not a url"), "unknown");
        assert_eq!(domain("file:///tmp/page.html"), "unknown");
    }

    #[test]
    fn test_persist_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let persister = FsPersister::new(tmp.path().join("features"));
        let text = assemble_feature("https://example.com", &["  Scenario: X".to_string()]);

        let path = persister
            .persist("https://example.com", &text, Category::Popup)
            .unwrap();

        assert!(path.starts_with(persister.dir()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("example_com__popup__"));
        assert!(name.ends_with(".feature"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }
}
