//! Guest note persistence over the Firestore REST API.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{GuestNote, NewNote, NotePosition};
use crate::config::GuestboardConfig;

/// Remote storage for guest notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Write a note and return the id assigned by the store.
    async fn add_note(&self, note: &NewNote) -> Result<String>;
    /// Every note, newest first.
    async fn list_notes(&self) -> Result<Vec<GuestNote>>;
}

/// Firestore-backed note store.
#[derive(Clone, Debug)]
pub struct FirestoreStore {
    http: Client,
    documents_url: String,
    collection: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    /// Validate the configuration and build the client.
    pub fn new(http: Client, cfg: &GuestboardConfig) -> Result<Self> {
        if cfg.project_id.trim().is_empty() {
            return Err(anyhow!("guestboard.project_id is not set"));
        }
        if cfg.collection.trim().is_empty() {
            return Err(anyhow!("guestboard.collection is not set"));
        }
        let base = cfg.firestore_base_url.trim_end_matches('/');
        Url::parse(base).map_err(|e| anyhow!("invalid firestore_base_url {base:?}: {e}"))?;

        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            base,
            urlencoding::encode(cfg.project_id.trim())
        );
        tracing::info!("note store ready: {documents_url}/{}", cfg.collection);
        Ok(Self {
            http,
            documents_url,
            collection: cfg.collection.trim().to_string(),
            api_key: Some(cfg.api_key.clone()).filter(|k| !k.is_empty()),
        })
    }

    fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.query(&[("key", key)]),
            None => req,
        }
    }
}

#[async_trait]
impl NoteStore for FirestoreStore {
    async fn add_note(&self, note: &NewNote) -> Result<String> {
        let url = format!(
            "{}/{}",
            self.documents_url,
            urlencoding::encode(&self.collection)
        );
        let body = Document {
            name: String::new(),
            fields: note_fields(note, Utc::now()),
        };
        let resp = self.with_key(self.http.post(url)).json(&body).send().await?;
        let resp = ensure_success(resp).await?;
        let created = resp.json::<Document>().await?;
        let id = document_id(&created.name)
            .ok_or_else(|| anyhow!("created document has no name"))?;
        Ok(id.to_string())
    }

    async fn list_notes(&self) -> Result<Vec<GuestNote>> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = RunQuery::newest_first(&self.collection);
        let resp = self.with_key(self.http.post(url)).json(&body).send().await?;
        let resp = ensure_success(resp).await?;
        let rows = resp.json::<Vec<RunQueryRow>>().await?;
        Ok(notes_from_rows(rows))
    }
}

/// Typed Firestore value; exactly one field is set.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Value {
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    double_value: Option<f64>,
    /// Firestore encodes 64-bit integers as strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    integer_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    map_value: Option<MapValue>,
}

impl Value {
    fn string(s: impl Into<String>) -> Self {
        Self {
            string_value: Some(s.into()),
            ..Self::default()
        }
    }

    fn double(v: f64) -> Self {
        Self {
            double_value: Some(v),
            ..Self::default()
        }
    }

    fn timestamp(t: DateTime<Utc>) -> Self {
        Self {
            timestamp_value: Some(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..Self::default()
        }
    }

    fn map(fields: HashMap<String, Value>) -> Self {
        Self {
            map_value: Some(MapValue { fields }),
            ..Self::default()
        }
    }

    fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    fn as_f64(&self) -> Option<f64> {
        self.double_value
            .or_else(|| self.integer_value.as_deref()?.parse().ok())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct MapValue {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQuery {
    structured_query: StructuredQuery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery {
    from: Vec<CollectionSelector>,
    order_by: Vec<Order>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Debug, Serialize)]
struct Order {
    field: FieldReference,
    direction: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: &'static str,
}

impl RunQuery {
    fn newest_first(collection: &str) -> Self {
        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection.to_string(),
                }],
                order_by: vec![Order {
                    field: FieldReference { field_path: "date" },
                    direction: "DESCENDING",
                }],
            },
        }
    }
}

/// Document fields for a new note. The message is stored as `content`.
fn note_fields(note: &NewNote, now: DateTime<Utc>) -> HashMap<String, Value> {
    let position = HashMap::from([
        ("x".to_string(), Value::double(note.position.x)),
        ("y".to_string(), Value::double(note.position.y)),
    ]);
    HashMap::from([
        ("name".to_string(), Value::string(&note.name)),
        ("city".to_string(), Value::string(&note.city)),
        ("content".to_string(), Value::string(&note.message)),
        ("position".to_string(), Value::map(position)),
        ("date".to_string(), Value::timestamp(now)),
    ])
}

/// Last path segment of a document resource name.
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Decode a stored document, filling gaps with neutral values.
fn note_from_document(doc: Document) -> Option<GuestNote> {
    let id = document_id(&doc.name)?.to_string();
    let text = |key: &str| {
        doc.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let date = doc
        .fields
        .get("date")
        .and_then(|v| v.timestamp_value.as_deref())
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let position = doc
        .fields
        .get("position")
        .and_then(|v| v.map_value.as_ref())
        .map(|m| {
            let coord = |k: &str| m.fields.get(k).and_then(Value::as_f64).unwrap_or(0.0);
            NotePosition {
                x: coord("x"),
                y: coord("y"),
            }
        })
        .unwrap_or_default();

    Some(GuestNote {
        name: text("name"),
        city: text("city"),
        message: text("content"),
        id,
        date,
        position,
    })
}

fn notes_from_rows(rows: Vec<RunQueryRow>) -> Vec<GuestNote> {
    let mut notes: Vec<GuestNote> = rows
        .into_iter()
        .filter_map(|r| r.document)
        .filter_map(note_from_document)
        .collect();
    notes.sort_by(|a, b| b.date.cmp(&a.date));
    notes
}

/// Convert non-2xx responses into a structured error.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_else(|_| "".into());
    Err(anyhow!("HTTP status {status} error: {body}"))
}
