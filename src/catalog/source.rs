use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use super::skill::{SkillDefinition, id_from_value, kind};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read skill catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("skill catalog {path} is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("skill catalog {path} has no `skills` array")]
    MissingSkills { path: PathBuf },
    #[error("skill catalog {path} has an unexpected shape: found {found} where an array or object was expected")]
    UnexpectedShape { path: PathBuf, found: &'static str },
}

/// Upstream collaborators the engine reads from. Retry policy lives with the
/// implementor; the viewer only re-invokes on reload.
pub trait SkillSource: Send + Sync {
    fn fetch_catalog(&self) -> Result<Vec<SkillDefinition>, FetchError>;
    fn fetch_current_user(&self) -> Result<Option<String>, FetchError>;
}

#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
    user_override: Option<String>,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, user_override: Option<String>) -> Self {
        Self {
            path: path.into(),
            user_override,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Value, FetchError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| FetchError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn unexpected_shape(&self, found: &Value) -> FetchError {
        FetchError::UnexpectedShape {
            path: self.path.clone(),
            found: kind(found),
        }
    }
}

fn user_from_document(document: &Map<String, Value>) -> Option<String> {
    let current_user = ["currentUser", "current_user", "user"]
        .iter()
        .find_map(|key| document.get(*key))?;
    match current_user {
        Value::Object(object) => object.get("id").and_then(id_from_value),
        other => id_from_value(other),
    }
}

impl SkillSource for JsonFileSource {
    fn fetch_catalog(&self) -> Result<Vec<SkillDefinition>, FetchError> {
        let entries = match self.read_document()? {
            Value::Array(entries) => entries,
            Value::Object(mut document) => match document.remove("skills") {
                Some(Value::Array(entries)) => entries,
                Some(Value::Null) | None => {
                    return Err(FetchError::MissingSkills {
                        path: self.path.clone(),
                    });
                }
                Some(other) => return Err(self.unexpected_shape(&other)),
            },
            other => return Err(self.unexpected_shape(&other)),
        };

        let skills = entries
            .into_iter()
            .map(SkillDefinition::from_entry)
            .collect::<Vec<_>>();
        let rejected = skills.iter().filter(|skill| skill.rejected.is_some()).count();
        if rejected > 0 {
            tracing::warn!(
                path = %self.path.display(),
                rejected,
                "catalog contains entries that are not skills"
            );
        }
        Ok(skills)
    }

    fn fetch_current_user(&self) -> Result<Option<String>, FetchError> {
        if let Some(user) = &self.user_override {
            return Ok(Some(user.clone()));
        }

        match self.read_document()? {
            Value::Object(document) => Ok(user_from_document(&document)),
            _ => Ok(None),
        }
    }
}

/// One completed round trip to both collaborators.
#[derive(Debug)]
pub struct CatalogFetch {
    pub skills: Vec<SkillDefinition>,
    pub user: Option<String>,
}

pub fn fetch_all(source: &dyn SkillSource) -> Result<CatalogFetch, FetchError> {
    let skills = source.fetch_catalog()?;
    let user = source.fetch_current_user()?;
    tracing::info!(skills = skills.len(), user = ?user, "fetched skill catalog");
    Ok(CatalogFetch { skills, user })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::constellation::{HierarchyTransformer, PinStore, ProgressionCurve};
    use crate::diagnostics::Diagnostic;

    fn write_catalog(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp catalog");
        file.write_all(body.as_bytes()).expect("write temp catalog");
        file
    }

    #[test]
    fn reads_document_with_current_user_object() {
        let file = write_catalog(
            r#"{"currentUser":{"id":5},"skills":[{"id":1,"name":"Core","parentId":null}]}"#,
        );
        let source = JsonFileSource::new(file.path(), None);
        let fetched = fetch_all(&source).expect("catalog loads");
        assert_eq!(fetched.skills.len(), 1);
        assert_eq!(fetched.user.as_deref(), Some("5"));
    }

    #[test]
    fn bare_array_has_no_user_unless_overridden() {
        let file = write_catalog(r#"[{"id":"a"},{"id":"b","parentId":"a"}]"#);
        let source = JsonFileSource::new(file.path(), None);
        assert_eq!(source.fetch_catalog().expect("catalog loads").len(), 2);
        assert_eq!(source.fetch_current_user().expect("user lookup"), None);

        let overridden = JsonFileSource::new(file.path(), Some("u1".to_owned()));
        assert_eq!(
            overridden.fetch_current_user().expect("user lookup").as_deref(),
            Some("u1")
        );
    }

    #[test]
    fn missing_file_and_missing_skills_are_fetch_errors() {
        let source = JsonFileSource::new("/nonexistent/skill-catalog.json", None);
        assert!(matches!(source.fetch_catalog(), Err(FetchError::Read { .. })));

        let file = write_catalog(r#"{"currentUser":"u1"}"#);
        let source = JsonFileSource::new(file.path(), None);
        assert!(matches!(
            source.fetch_catalog(),
            Err(FetchError::MissingSkills { .. })
        ));

        let file = write_catalog(r#"{"skills":"none"}"#);
        let source = JsonFileSource::new(file.path(), None);
        assert!(matches!(
            source.fetch_catalog(),
            Err(FetchError::UnexpectedShape { found: "a string", .. })
        ));
    }

    #[test]
    fn malformed_entries_do_not_fail_the_fetch() {
        let file = write_catalog(
            r#"{"currentUser":"u1","skills":[
                {"id":"s","unlocks":{"userId":"u1","level":2}},
                null,
                {"id":"t","parentId":"s","unlocks":null,"progress":"[]"},
                7
            ]}"#,
        );
        let source = JsonFileSource::new(file.path(), None);
        let fetched = fetch_all(&source).expect("catalog loads despite bad entries");
        assert_eq!(fetched.skills.len(), 4);
        assert_eq!(fetched.skills[2].id.as_deref(), Some("t"));

        let (transformer, diagnostics) =
            HierarchyTransformer::new(fetched.skills, ProgressionCurve::default());
        let malformed = diagnostics
            .iter()
            .filter_map(|diagnostic| match diagnostic {
                Diagnostic::MalformedSkillEntry { position, .. } => Some(*position),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(malformed, vec![1, 3]);

        let transformed = transformer.transform(fetched.user.as_deref(), &PinStore::default());
        assert_eq!(transformed.graph.nodes.len(), 1);
        assert_eq!(transformed.graph.nodes[0].id, "s");
    }
}
