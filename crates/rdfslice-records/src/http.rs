//! Blocking HTTP client for the record-store service.

use crate::auth::Credentials;
use crate::resultset::{dataset_metadata, error_body};
use crate::{ApiFailure, ApiResult, DatasetMetadata, IndexationMode, Operation, RecordStore, N3_MIME};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use url::Url;

/// Largest document prefix echoed into a failure's request summary.
const REQUEST_ECHO_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
pub struct HttpRecordStoreConfig {
    /// Service root, e.g. `http://localhost/ws/`.
    pub endpoint: String,
    pub credentials: Credentials,
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct HttpRecordStore {
    client: Client,
    root: Url,
    credentials: Credentials,
}

fn truncate_for_echo(value: &str) -> String {
    if value.len() <= REQUEST_ECHO_LIMIT {
        return value.to_string();
    }
    let mut end = REQUEST_ECHO_LIMIT;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &value[..end], value.len())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl HttpRecordStore {
    pub fn new(config: HttpRecordStoreConfig) -> ApiResult<Self> {
        let mut endpoint = config.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let root = Url::parse(&endpoint).map_err(|e| {
            ApiFailure::new(
                Operation::DatasetRead,
                format!("invalid service endpoint `{}`: {e}", config.endpoint),
            )
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ApiFailure::new(Operation::DatasetRead, format!("failed to build http client: {e}"))
            })?;
        Ok(Self {
            client,
            root,
            credentials: config.credentials,
        })
    }

    fn request_summary(params: &[(&str, &str)]) -> serde_json::Value {
        let map = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::String(truncate_for_echo(v))))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Sends one signed form POST and returns the response body of a successful call.
    fn call(&self, operation: Operation, params: &[(&str, &str)]) -> ApiResult<String> {
        let failure = |message: String| ApiFailure {
            request: Self::request_summary(params),
            ..ApiFailure::new(operation, message)
        };

        let url = self
            .root
            .join(operation.path())
            .map_err(|e| failure(format!("invalid endpoint path: {e}")))?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().copied())
            .finish();
        let signed = self
            .credentials
            .sign(
                "POST",
                url.host_str().unwrap_or_default(),
                url.path(),
                &body,
                unix_timestamp(),
            )
            .map_err(|e| failure(format!("failed to sign request: {e}")))?;

        let started = Instant::now();
        let response = self
            .client
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("OSF-TS", signed.timestamp)
            .header("OSF-APP-ID", signed.app_id)
            .header("OSF-USER-URI", signed.user)
            .header(AUTHORIZATION, signed.authorization)
            .body(body)
            .send()
            .map_err(|e| failure(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| failure(format!("failed to read response from {url}: {e}")))?;
        tracing::debug!(
            operation = %operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "record-store call"
        );

        if status.is_success() {
            return Ok(text);
        }

        let parsed = error_body(&text).unwrap_or_default();
        let description = match (&parsed.name, &parsed.description) {
            (Some(name), Some(desc)) => format!("{name}: {desc}"),
            (Some(name), None) => name.clone(),
            (None, Some(desc)) => desc.clone(),
            (None, None) => text.clone(),
        };
        Err(ApiFailure {
            operation,
            status: Some(status.as_u16()),
            error_id: parsed.id,
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            description,
            request: Self::request_summary(params),
            response: Some(text),
        })
    }
}

impl RecordStore for HttpRecordStore {
    fn read_dataset(&self, uri: &str) -> ApiResult<Option<DatasetMetadata>> {
        match self.call(Operation::DatasetRead, &[("uri", uri), ("meta", "True")]) {
            Ok(body) => {
                let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| ApiFailure {
                    response: Some(body.clone()),
                    ..ApiFailure::new(
                        Operation::DatasetRead,
                        format!("dataset read returned invalid JSON: {e}"),
                    )
                })?;
                Ok(Some(dataset_metadata(&json, uri)))
            }
            Err(failure) if failure.is_not_found() => Ok(None),
            Err(failure) => Err(failure),
        }
    }

    fn create_dataset(&self, uri: &str, metadata: &DatasetMetadata) -> ApiResult<()> {
        self.call(
            Operation::DatasetCreate,
            &[
                ("uri", uri),
                ("title", &metadata.title),
                ("description", &metadata.description),
                ("creator", &metadata.creator),
            ],
        )
        .map(drop)
    }

    fn delete_dataset(&self, uri: &str) -> ApiResult<()> {
        self.call(Operation::DatasetDelete, &[("uri", uri)]).map(drop)
    }

    fn create_records(&self, dataset: &str, n3: &str, mode: IndexationMode) -> ApiResult<()> {
        self.call(
            Operation::CrudCreate,
            &[
                ("dataset", dataset),
                ("mime", N3_MIME),
                ("document", n3),
                ("mode", mode.as_param()),
            ],
        )
        .map(drop)
    }

    fn update_records(&self, dataset: &str, n3: &str) -> ApiResult<()> {
        self.call(
            Operation::CrudUpdate,
            &[("dataset", dataset), ("mime", N3_MIME), ("document", n3)],
        )
        .map(drop)
    }

    fn delete_record(&self, dataset: &str, uri: &str) -> ApiResult<()> {
        self.call(Operation::CrudDelete, &[("dataset", dataset), ("uri", uri)])
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_documents_are_truncated_in_summaries() {
        let doc = "x".repeat(REQUEST_ECHO_LIMIT * 2);
        let summary = HttpRecordStore::request_summary(&[("document", &doc)]);
        let echoed = summary["document"].as_str().unwrap();
        let suffix = echoed.trim_start_matches('x');
        assert_eq!(echoed.len() - suffix.len(), REQUEST_ECHO_LIMIT);
        assert_eq!(suffix, format!("… ({} bytes)", doc.len()));
    }

    #[test]
    fn endpoint_gets_a_trailing_slash() {
        let store = HttpRecordStore::new(HttpRecordStoreConfig {
            endpoint: "http://localhost/ws".to_string(),
            credentials: Credentials::default(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(
            store.root.join(Operation::CrudCreate.path()).unwrap().as_str(),
            "http://localhost/ws/crud/create/"
        );
    }
}
