//! The result printed for a discovery request.

use serde::Serialize;

use crate::feature::{assemble_feature, FeaturePersister};
use crate::scenario::{Category, ScenarioGroups};
use crate::{Error, Result};

pub const NOTHING_FOUND: &str =
    "No interactive elements (hover menus or popups) were detected on the page.";

/// A written feature file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFile {
    #[serde(rename = "type")]
    pub category: Category,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report {
    Success { files: Vec<ReportFile> },
    Failed { message: String },
}

impl Report {
    /// Assemble and persist one feature file per non-empty group.
    pub fn publish<P>(source_url: &str, groups: &ScenarioGroups, persister: &P) -> Result<Self>
    where
        P: FeaturePersister + ?Sized,
    {
        let mut files = Vec::new();
        for (category, scenarios) in groups.non_empty() {
            let text = assemble_feature(source_url, scenarios);
            let path = persister.persist(source_url, &text, category)?;
            files.push(ReportFile {
                category,
                path: path.display().to_string(),
            });
        }
        Ok(Self::from_files(files))
    }

    /// Success with `files`, or the nothing-found failure when empty.
    pub fn from_files(files: Vec<ReportFile>) -> Self {
        if files.is_empty() {
            Report::Failed {
                message: NOTHING_FOUND.to_string(),
            }
        } else {
            Report::Success { files }
        }
    }

    pub fn failure(error: &Error) -> Self {
        Report::Failed {
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryPersister {
        written: RefCell<Vec<(Category, String)>>,
    }

    impl FeaturePersister for MemoryPersister {
        fn persist(&self, _url: &str, text: &str, category: Category) -> Result<PathBuf> {
            self.written.borrow_mut().push((category, text.to_string()));
            Ok(PathBuf::from(format!("out/{category}.feature")))
        }
    }

    #[test]
    fn test_success_json_shape() {
        let report = Report::from_files(vec![ReportFile {
            category: Category::Hover,
            path: "out/a.feature".into(),
        }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "success",
                "files": [{"type": "hover", "path": "out/a.feature"}]
            })
        );
    }

    #[test]
    fn test_empty_is_failed() {
        let report = Report::from_files(vec![]);
        assert!(!report.is_success());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], NOTHING_FOUND);
    }

    #[test]
    fn test_failure_from_error() {
        let report = Report::failure(&Error::Navigation("https://x.invalid: dns".into()));
        assert_eq!(
            report,
            Report::Failed {
                message: "navigation failed: https://x.invalid: dns".into()
            }
        );
    }

    #[test]
    fn test_publish_skips_empty_groups() {
        let groups = ScenarioGroups {
            hover: vec![],
            popup: vec!["  Scenario: P".into()],
        };
        let persister = MemoryPersister::default();
        let report = Report::publish("https://example.com", &groups, &persister).unwrap();

        assert_eq!(
            report,
            Report::Success {
                files: vec![ReportFile {
                    category: Category::Popup,
                    path: "out/popup.feature".into()
                }]
            }
        );
        let written = persister.written.borrow();
        assert_eq!(written.len(), 1);
        assert!(written[0].1.starts_with("Feature: Automated tests for example.com"));
    }
}
