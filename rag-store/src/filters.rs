//! Filter conversion to Qdrant `Filter`.
//!
//! Exact equality on scalar fields (`String`, integer `Number`, `Bool`); all
//! conditions must hold. Keyword matches on array payload fields succeed when
//! any element equals the value, mirroring [`RagFilter::matches`].

use qdrant_client::qdrant::{Condition, Filter};
use serde_json::Value;
use tracing::{debug, warn};

use crate::record::RagFilter;

/// Converts [`RagFilter`] to a Qdrant `must` [`Filter`].
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!(equals = f.equals.len(), "filters::to_qdrant_filter");

    let must: Vec<Condition> = f
        .equals
        .iter()
        .filter_map(|(field, val)| match val {
            Value::String(s) => Some(Condition::matches(field.clone(), s.clone())),
            Value::Bool(b) => Some(Condition::matches(field.clone(), *b)),
            Value::Number(n) => n.as_i64().map(|i| Condition::matches(field.clone(), i)),
            _ => {
                warn!(field = %field, "unsupported filter value type; condition skipped");
                None
            }
        })
        .collect();

    Filter::must(must)
}
