//! The structured profile record.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CorpusError;

const BUILTIN_PROFILE: &str = include_str!("../data/profile.json");

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub description: String,
}

/// One role described as Situation / Task / Action / Result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarExperience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    pub situation: String,
    pub task: String,
    pub action: Vec<String>,
    pub result: String,
    /// Project headline, also used as the `project` metadata field.
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Everything the assistant knows about the candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default, alias = "starExperiences")]
    pub experiences: Vec<StarExperience>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl ProfileRecord {
    /// Profile compiled into the binary.
    pub fn builtin() -> Result<Self, CorpusError> {
        Self::from_json(BUILTIN_PROFILE)
    }

    pub fn from_json(raw: &str) -> Result<Self, CorpusError> {
        let profile: Self = serde_json::from_str(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads a JSON profile from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profile = Self::from_json(&raw)?;
        info!(path = %path.display(), experiences = profile.experiences.len(), "profile loaded");
        Ok(profile)
    }

    /// `PROFILE_PATH` when set, otherwise the built-in profile.
    pub fn from_env() -> Result<Self, CorpusError> {
        match std::env::var("PROFILE_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<(), CorpusError> {
        if self.name.trim().is_empty() {
            return Err(CorpusError::Invalid("profile name is empty".into()));
        }
        if self.summary.trim().is_empty() {
            return Err(CorpusError::Invalid("profile summary is empty".into()));
        }
        if let Some(exp) = self.experiences.iter().find(|e| e.category.trim().is_empty()) {
            return Err(CorpusError::Invalid(format!(
                "experience `{}` has no category",
                exp.situation
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profile_parses() {
        let p = ProfileRecord::builtin().unwrap();
        assert!(!p.experiences.is_empty());
        assert!(p.skills.technical.iter().any(|s| s.contains("AWS")));
    }

    #[test]
    fn accepts_star_experiences_alias_and_rejects_blank_name() {
        let raw = r#"{"name":"A","title":"T","summary":"S","starExperiences":[
            {"situation":"s","task":"t","action":["a"],"result":"r","category":"C"}]}"#;
        assert_eq!(ProfileRecord::from_json(raw).unwrap().experiences.len(), 1);

        let blank = r#"{"name":" ","title":"T","summary":"S"}"#;
        assert!(matches!(ProfileRecord::from_json(blank), Err(CorpusError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ProfileRecord::load("/nonexistent/profile.json").unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
