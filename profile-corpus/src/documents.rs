//! Profile record → chunk list.
//!
//! Every chunk id is derived from the record's structure (section, project
//! slug, STAR part, position), so rebuilding the corpus from an unchanged
//! record yields identical ids and re-indexing replaces rather than duplicates.

use rag_store::{Chunk, ChunkMetadata};
use serde::Deserialize;
use serde_json::{Map, Value};
use services::uuid::content_id;

use crate::error::CorpusError;
use crate::profile::{ProfileRecord, StarExperience};

/// Free-form document supplied at initialize time.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DocumentInput {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Lowercase ASCII slug: runs of non-alphanumerics collapse to one `-`.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn chunk(id: String, content: String, metadata: ChunkMetadata) -> Chunk {
    Chunk {
        id,
        content,
        metadata,
    }
}

fn meta(category: &str, kind: &str, title: impl Into<String>) -> ChunkMetadata {
    let mut m = ChunkMetadata::new(category, kind);
    m.title = Some(title.into());
    m.source = Some("profile".into());
    m
}

fn experience_chunks(exp: &StarExperience) -> Vec<Chunk> {
    let slug = slugify(&exp.category);
    let base = |kind: &str| {
        let mut m = meta("experience", kind, exp.category.clone());
        m.project = Some(exp.category.clone());
        if let Some(company) = &exp.company {
            m.extra.insert("company".into(), Value::String(company.clone()));
        }
        m
    };
    let at = exp
        .company
        .as_deref()
        .map(|c| format!(" at {c}"))
        .unwrap_or_default();

    let mut complete = base("complete");
    complete.keywords = exp.keywords.clone();

    vec![
        chunk(
            format!("experience:{slug}:situation"),
            format!("Project: {}{at}. Situation: {}", exp.category, exp.situation),
            base("situation"),
        ),
        chunk(
            format!("experience:{slug}:task"),
            format!("Project: {}{at}. Task: {}", exp.category, exp.task),
            base("task"),
        ),
        chunk(
            format!("experience:{slug}:action"),
            format!("Project: {}{at}. Actions taken: {}", exp.category, exp.action.join(". ")),
            base("action"),
        ),
        chunk(
            format!("experience:{slug}:result"),
            format!("Project: {}{at}. Result: {}", exp.category, exp.result),
            base("result"),
        ),
        chunk(
            format!("experience:{slug}:complete"),
            format!(
                "{} project{at} involving {}. Full details: Situation - {}. Task - {}. Actions - {}. Result - {}",
                exp.category,
                exp.keywords.join(", "),
                exp.situation,
                exp.task,
                exp.action.join("; "),
                exp.result
            ),
            complete,
        ),
    ]
}

/// Deterministic chunk list for a profile record.
pub fn build_documents(profile: &ProfileRecord) -> Vec<Chunk> {
    let mut out = Vec::new();

    out.push(chunk(
        "overview:summary".into(),
        format!("{} is a {}. {}", profile.name, profile.title, profile.summary),
        meta("overview", "summary", "Professional Overview"),
    ));

    if !profile.skills.technical.is_empty() {
        out.push(chunk(
            "skills:technical".into(),
            format!("Technical Skills: {}.", profile.skills.technical.join(", ")),
            meta("skills", "technical", "Technical Skills"),
        ));
    }
    if !profile.skills.soft.is_empty() {
        out.push(chunk(
            "skills:soft".into(),
            format!(
                "Soft Skills and Professional Qualities: {}.",
                profile.skills.soft.join(", ")
            ),
            meta("skills", "soft", "Soft Skills"),
        ));
    }

    for (i, edu) in profile.education.iter().enumerate() {
        let year = if edu.year.is_empty() {
            String::new()
        } else {
            format!(" ({})", edu.year)
        };
        out.push(chunk(
            format!("education:{i}"),
            format!(
                "Education: {} from {}{year}. {}",
                edu.degree, edu.institution, edu.description
            )
            .trim_end()
            .to_string(),
            meta("education", "degree", "Education"),
        ));
    }

    for exp in &profile.experiences {
        out.extend(experience_chunks(exp));
    }

    for (i, a) in profile.achievements.iter().enumerate() {
        out.push(chunk(
            format!("achievements:{i}"),
            format!("Achievement: {a}"),
            meta("achievements", "accomplishment", "Achievement"),
        ));
    }
    for (i, c) in profile.certifications.iter().enumerate() {
        out.push(chunk(
            format!("certifications:{i}"),
            format!("Certification: {c}"),
            meta("certifications", "credential", "Certification"),
        ));
    }
    if !profile.interests.is_empty() {
        out.push(chunk(
            "interests".into(),
            format!("Interests outside work: {}.", profile.interests.join(", ")),
            meta("interests", "personal", "Interests"),
        ));
    }

    out
}

/// Chunks for caller-supplied documents; ids are content hashes.
///
/// Blank documents are rejected. `metadata` must deserialize into
/// [`ChunkMetadata`] (unknown keys are kept).
pub fn chunks_from_documents(docs: Vec<DocumentInput>) -> Result<Vec<Chunk>, CorpusError> {
    docs.into_iter()
        .enumerate()
        .map(|(i, doc)| {
            if doc.content.trim().is_empty() {
                return Err(CorpusError::Invalid(format!("document {i} has empty content")));
            }
            let metadata: ChunkMetadata = serde_json::from_value(Value::Object(doc.metadata))?;
            Ok(Chunk {
                id: content_id("doc", &doc.content),
                content: doc.content,
                metadata,
            })
        })
        .collect()
}
