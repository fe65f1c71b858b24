//! Qdrant-backed vector store
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointStruct, SearchPoints, Value as QdrantValue, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::store::{ScoredMatch, VectorRecord, VectorStore};

/// Vector store backed by a qdrant collection
pub struct QdrantStore {
    client: QdrantClient,
    collection: String,
}

impl QdrantStore {
    /// Connect to qdrant and ensure the collection exists.
    ///
    /// A missing collection is created with cosine distance and the
    /// embedder's vector dimension.
    pub async fn connect(url: &str, collection: &str, dimension: u64) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create qdrant client")?;

        let store = Self {
            client,
            collection: collection.to_string(),
        };

        store.ensure_collection(dimension).await?;

        Ok(store)
    }

    /// Create the collection if it is not already present
    async fn ensure_collection(&self, dimension: u64) -> Result<()> {
        let collections_list = self
            .client
            .list_collections()
            .await
            .context("Failed to list qdrant collections")?;

        let exists = collections_list
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: dimension,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
        }

        Ok(())
    }

    /// Number of points currently stored in the collection
    pub async fn point_count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload_map = HashMap::new();
                for (key, value) in record.payload {
                    payload_map.insert(key, json_to_qdrant_value(value));
                }
                PointStruct::new(record.id, record.values, payload_map)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert points")?;

        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredMatch>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector,
                limit: top_k as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                with_vectors: Some(false.into()),
                ..Default::default()
            })
            .await
            .context("Failed to search points")?;

        let matches = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point
                    .payload
                    .into_iter()
                    .filter_map(|(key, value)| {
                        qdrant_to_json_value(&value).map(|json| (key, json))
                    })
                    .collect();

                ScoredMatch {
                    score: point.score,
                    payload,
                }
            })
            .collect();

        Ok(matches)
    }
}

// Payload type conversions between serde_json and qdrant values
fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(b),
        _ => QdrantValue::from(""),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
            Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
            Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    })
}
