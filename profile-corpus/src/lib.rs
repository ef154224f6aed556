//! Document store for the profile assistant.
//!
//! A [`ProfileRecord`] (built in, or loaded from `PROFILE_PATH`) is split by
//! [`build_documents`] into small retrievable chunks: overview, skills,
//! education, one chunk per STAR part of every experience, achievements,
//! certifications and interests.

mod documents;
mod error;
mod profile;

pub use documents::{DocumentInput, build_documents, chunks_from_documents, slugify};
pub use error::CorpusError;
pub use profile::{Education, ProfileRecord, Skills, StarExperience};
