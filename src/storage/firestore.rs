//! Document store implementation over the Firestore REST api.

use super::{StorageApi, api::Result};
use crate::{
    error::StorageError,
    types::{Address, AppId, EscrowRecord, RecordStatus},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, trace, warn};
use url::Url;

/// Document field holding the application id.
const APP_ID_FIELD: &str = "appId";
/// Document field holding the client address.
const CLIENT_ADDRESS_FIELD: &str = "clientAddress";
/// Document field holding the freelancer address.
const FREELANCER_ADDRESS_FIELD: &str = "freelancerAddress";
/// Document field holding the record status.
const STATUS_FIELD: &str = "status";
/// Document field holding the last update time.
const UPDATED_AT_FIELD: &str = "updatedAt";

/// [`StorageApi`] implementation backed by a Firestore collection.
///
/// Each escrow is a document keyed by its application id.
#[derive(Debug, Clone)]
pub struct FirestoreStorage {
    client: Client,
    documents_url: Url,
    collection: String,
    api_key: Option<String>,
}

impl FirestoreStorage {
    /// Create a new store for `collection` of the default database of `project_id`.
    pub fn new(
        endpoint: &Url,
        project_id: &str,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let mut documents_url = endpoint.clone();
        documents_url
            .path_segments_mut()
            .map_err(|_| StorageError::MalformedDocument(format!("invalid endpoint {endpoint}")))?
            .pop_if_empty()
            .extend(["projects", project_id, "databases", "(default)", "documents"]);

        Ok(Self { client: Client::new(), documents_url, collection: collection.into(), api_key })
    }

    fn document_url(&self, app_id: AppId) -> Url {
        let mut url = self.documents_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&self.collection).push(&app_id.to_string());
        }
        url
    }

    fn query_url(&self) -> Url {
        let mut url = self.documents_url.clone();
        let path = format!("{}:runQuery", url.path());
        url.set_path(&path);
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    async fn patch(&self, app_id: AppId, query: &[(&str, &str)], fields: Value) -> Result<Response> {
        let url = self.document_url(app_id);
        trace!(%url, "PATCH");
        Ok(self
            .authorize(self.client.patch(url))
            .query(query)
            .json(&json!({ "fields": fields }))
            .send()
            .await?)
    }
}

#[async_trait]
impl StorageApi for FirestoreStorage {
    async fn read_escrow(&self, app_id: AppId) -> Result<Option<EscrowRecord>> {
        let response = self.authorize(self.client.get(self.document_url(app_id))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = check(response).await?.json().await?;
        document.into_record().map(Some)
    }

    async fn read_client_escrows(&self, client: &Address) -> Result<Vec<EscrowRecord>> {
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": CLIENT_ADDRESS_FIELD },
                        "op": "EQUAL",
                        "value": { "stringValue": client.to_string() },
                    }
                },
            }
        });

        let response =
            self.authorize(self.client.post(self.query_url())).json(&query).send().await?;
        let results: Vec<QueryResult> = check(response).await?.json().await?;

        let records = query_records(results);
        debug!(%client, records = records.len(), "Read client escrows");
        Ok(records)
    }

    async fn write_escrow(&self, record: &EscrowRecord) -> Result<()> {
        let response = self.patch(record.app_id, &[], record_fields(record)).await?;
        check(response).await?;
        Ok(())
    }

    async fn update_escrow_status(&self, app_id: AppId, status: RecordStatus) -> Result<()> {
        let fields = json!({
            STATUS_FIELD: { "stringValue": status.as_str() },
            UPDATED_AT_FIELD: { "timestampValue": Utc::now() },
        });
        let response = self
            .patch(
                app_id,
                &[
                    ("updateMask.fieldPaths", STATUS_FIELD),
                    ("updateMask.fieldPaths", UPDATED_AT_FIELD),
                    ("currentDocument.exists", "true"),
                ],
                fields,
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::EscrowNotFound(app_id));
        }
        check(response).await?;
        Ok(())
    }
}

/// Passes successful responses through and turns error statuses into [`StorageError::Api`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|err| err.error.message)
        .unwrap_or(body);
    Err(StorageError::Api { status: status.as_u16(), message })
}

/// Encodes a record as Firestore document fields.
fn record_fields(record: &EscrowRecord) -> Value {
    let mut fields = json!({
        APP_ID_FIELD: { "integerValue": record.app_id.get().to_string() },
        CLIENT_ADDRESS_FIELD: { "stringValue": record.client_address.to_string() },
        STATUS_FIELD: { "stringValue": record.status.as_str() },
        UPDATED_AT_FIELD: { "timestampValue": record.updated_at },
    });
    if let Some(freelancer) = record.freelancer_address {
        fields[FREELANCER_ADDRESS_FIELD] = json!({ "stringValue": freelancer.to_string() });
    }
    fields
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Converts query results into records sorted by application id.
///
/// Malformed documents are skipped so one bad record does not hide the others.
fn query_records(results: Vec<QueryResult>) -> Vec<EscrowRecord> {
    let mut records: Vec<_> = results
        .into_iter()
        .filter_map(|result| result.document)
        .filter_map(|document| {
            document.into_record().inspect_err(|err| warn!(%err, "Skipping escrow document")).ok()
        })
        .collect();
    records.sort_by_key(|record| record.app_id);
    records
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<Document>,
}

/// A Firestore document. Field values are tagged by type, e.g. `{"stringValue": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Document {
    fn into_record(self) -> Result<EscrowRecord> {
        let app_id = self
            .value(APP_ID_FIELD, "integerValue")
            .ok_or_else(|| self.malformed(APP_ID_FIELD))?
            .parse::<AppId>()
            .map_err(|_| self.malformed(APP_ID_FIELD))?;

        let client_address = self
            .value(CLIENT_ADDRESS_FIELD, "stringValue")
            .and_then(|address| address.parse::<Address>().ok())
            .ok_or_else(|| self.malformed(CLIENT_ADDRESS_FIELD))?;

        let freelancer_address = match self.value(FREELANCER_ADDRESS_FIELD, "stringValue") {
            Some(address) if !address.is_empty() => Some(
                address.parse::<Address>().map_err(|_| self.malformed(FREELANCER_ADDRESS_FIELD))?,
            ),
            _ => None,
        };

        let status = match self.value(STATUS_FIELD, "stringValue") {
            Some(status) => status.parse::<RecordStatus>().map_err(StorageError::MalformedDocument)?,
            None => RecordStatus::default(),
        };

        let updated_at = self
            .value(UPDATED_AT_FIELD, "timestampValue")
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_default();

        Ok(EscrowRecord { app_id, client_address, freelancer_address, status, updated_at })
    }

    fn value(&self, field: &str, ty: &str) -> Option<&str> {
        self.fields.get(field)?.get(ty)?.as_str()
    }

    fn malformed(&self, field: &str) -> StorageError {
        StorageError::MalformedDocument(format!("{}: missing or invalid {field}", self.name))
    }
}
