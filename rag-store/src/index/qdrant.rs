//! Qdrant-backed index.
//!
//! Concentrates all `qdrant-client` usage behind the [`VectorIndex`] contract:
//! - the collection is created lazily on the first upsert, sized from the
//!   first vector, with cosine distance
//! - point ids are UUIDv5 of the chunk id, so re-upserting replaces
//! - payload = chunk metadata (flattened, filterable) + `content` + `chunk_id`

use std::collections::HashMap;

use futures::future::BoxFuture;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Value};
use services::uuid::stable_uuid;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QdrantSettings;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::index::{VectorIndex, check_batch};
use crate::record::{ChunkMetadata, EmbeddedChunk, IndexInfo, RagFilter, SearchResult};

const CONTENT_KEY: &str = "content";
const CHUNK_ID_KEY: &str = "chunk_id";

fn qerr(e: impl std::fmt::Display) -> RagError {
    RagError::Qdrant(e.to_string())
}

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    /// Cached collection dimension; `None` until known.
    dimension: RwLock<Option<usize>>,
}

impl QdrantIndex {
    /// Builds the client. No network traffic happens until the first call.
    pub fn new(settings: &QdrantSettings) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&settings.url);
        if let Some(key) = &settings.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;
        Ok(Self {
            client,
            collection: settings.collection.clone(),
            dimension: RwLock::new(None),
        })
    }

    /// Point count and vector size of the collection, `None` if it does not exist.
    async fn describe(&self) -> Result<Option<(usize, Option<usize>)>, RagError> {
        if !self.client.collection_exists(&self.collection).await.map_err(qerr)? {
            return Ok(None);
        }
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(qerr)?
            .result;
        let count = info.as_ref().and_then(|r| r.points_count).unwrap_or(0) as usize;
        let dimension = info
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                VectorsConfigKind::Params(p) => Some(p.size as usize),
                _ => None,
            });
        Ok(Some((count, dimension)))
    }

    async fn known_dimension(&self) -> Result<Option<usize>, RagError> {
        if let Some(d) = *self.dimension.read().await {
            return Ok(Some(d));
        }
        let dim = self.describe().await?.and_then(|(_, d)| d);
        *self.dimension.write().await = dim;
        Ok(dim)
    }

    /// Creates the collection if missing.
    async fn ensure_collection(&self, size: usize) -> Result<(), RagError> {
        if self.client.collection_exists(&self.collection).await.map_err(qerr)? {
            return Ok(());
        }
        info!(collection = %self.collection, size, "creating qdrant collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(size as u64, Distance::Cosine)),
            )
            .await
            .map_err(qerr)?;
        Ok(())
    }
}

fn to_payload(item: &EmbeddedChunk) -> Result<Payload, RagError> {
    let mut map = match serde_json::to_value(&item.chunk.metadata)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert(CONTENT_KEY.into(), Value::String(item.chunk.content.clone()));
    map.insert(CHUNK_ID_KEY.into(), Value::String(item.chunk.id.clone()));
    Payload::try_from(Value::Object(map)).map_err(qerr)
}

/// Converts a Qdrant value tree into JSON.
fn qvalue_to_json(v: QValue) -> Value {
    match v.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

fn from_payload(score: f32, payload: HashMap<String, QValue>) -> Result<SearchResult, RagError> {
    let mut map: Map<String, Value> = payload
        .into_iter()
        .map(|(k, v)| (k, qvalue_to_json(v)))
        .collect();
    let content = match map.remove(CONTENT_KEY) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let id = match map.remove(CHUNK_ID_KEY) {
        Some(Value::String(s)) => s,
        _ => return Err(RagError::Qdrant("point payload has no chunk_id".into())),
    };
    let metadata: ChunkMetadata = serde_json::from_value(Value::Object(map))?;
    Ok(SearchResult {
        id,
        score,
        content,
        metadata,
    })
}

impl VectorIndex for QdrantIndex {
    fn upsert<'a>(&'a self, items: Vec<EmbeddedChunk>) -> BoxFuture<'a, Result<Vec<String>, RagError>> {
        Box::pin(async move {
            if items.is_empty() {
                return Ok(Vec::new());
            }
            let current = self.known_dimension().await?;
            let Some(dimension) = check_batch(&items, current)? else {
                return Ok(Vec::new());
            };
            self.ensure_collection(dimension).await?;
            *self.dimension.write().await = Some(dimension);

            let mut ids = Vec::with_capacity(items.len());
            let mut points = Vec::with_capacity(items.len());
            for item in &items {
                let payload = to_payload(item)?;
                points.push(PointStruct::new(
                    stable_uuid(&item.chunk.id).to_string(),
                    item.embedding.clone(),
                    payload,
                ));
                ids.push(item.chunk.id.clone());
            }

            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
                .map_err(qerr)?;

            debug!(collection = %self.collection, upserted = ids.len(), "qdrant upsert");
            Ok(ids)
        })
    }

    fn query<'a>(
        &'a self,
        embedding: &'a [f32],
        top_k: usize,
        filter: Option<&'a RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, RagError>> {
        Box::pin(async move {
            let Some(want) = self.known_dimension().await? else {
                return Ok(Vec::new());
            };
            if embedding.len() != want {
                return Err(RagError::DimensionMismatch {
                    got: embedding.len(),
                    want,
                });
            }
            if top_k == 0 {
                return Ok(Vec::new());
            }

            let mut builder =
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true);
            if let Some(f) = filter.filter(|f| !f.is_empty()) {
                builder = builder.filter(to_qdrant_filter(f));
            }

            let res = self.client.search_points(builder).await.map_err(qerr)?;

            let mut out = Vec::with_capacity(res.result.len());
            for point in res.result {
                match from_payload(point.score, point.payload) {
                    Ok(hit) => out.push(hit),
                    Err(e) => warn!(error = %e, "skipping point with unreadable payload"),
                }
            }
            // Qdrant already ranks; keep the ordering contract explicit.
            out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            Ok(out)
        })
    }

    fn reset<'a>(&'a self) -> BoxFuture<'a, Result<(), RagError>> {
        Box::pin(async move {
            if self.client.collection_exists(&self.collection).await.map_err(qerr)? {
                self.client
                    .delete_collection(&self.collection)
                    .await
                    .map_err(qerr)?;
                info!(collection = %self.collection, "qdrant collection deleted");
            }
            *self.dimension.write().await = None;
            Ok(())
        })
    }

    fn info<'a>(&'a self) -> BoxFuture<'a, Result<IndexInfo, RagError>> {
        Box::pin(async move {
            Ok(match self.describe().await? {
                Some((count, dimension)) => IndexInfo { count, dimension },
                None => IndexInfo::default(),
            })
        })
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::Chunk;

    #[test]
    fn payload_round_trip_keeps_metadata() {
        let mut metadata = ChunkMetadata::new("experience", "result");
        metadata.keywords = vec!["aws".into(), "terraform".into()];
        metadata.extra.insert("company".into(), json!("Acme"));
        let item = EmbeddedChunk {
            chunk: Chunk {
                id: "experience:acme:result".into(),
                content: "Cut deploy time by 60%".into(),
                metadata: metadata.clone(),
            },
            embedding: vec![0.1, 0.2],
        };

        let payload: HashMap<String, QValue> = to_payload(&item).unwrap().into();
        let hit = from_payload(0.9, payload).unwrap();
        assert_eq!(hit.id, "experience:acme:result");
        assert_eq!(hit.content, "Cut deploy time by 60%");
        assert_eq!(hit.metadata, metadata);
    }

    #[test]
    fn client_builds_without_network() {
        assert!(QdrantIndex::new(&QdrantSettings::default()).is_ok());
    }
}
