use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::filter::DateRange;
use crate::query::{
    CommentsQuery, DebatesQuery, DivisionsQuery, HansardQuery, MembersQuery, Params,
    RepresentativeQuery,
};
use crate::types::{Comment, Division, Member, RawRecord};

const CREDENTIAL_ERRORS: &[&str] = &["api key", "invalid key", "no key"];

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid query: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("HTTP status {status} from {function}")]
    Status { status: StatusCode, function: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Status { .. } | ClientError::Http(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl RecordClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::Auth("API key not provided".to_string()));
        }

        Ok(Self {
            client: crate::build_http_client(Duration::from_secs(30))?,
            api_url: crate::API_URL.to_string(),
            api_key,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn fetch_hansard(&self, query: &HansardQuery) -> Result<Vec<RawRecord>, ClientError> {
        let params = query.to_params()?;
        let data = self.call("getHansard", params).await?;
        decode_rows(unwrap_rows(data, "rows"))
    }

    pub async fn fetch_hansard_by_date_range(
        &self,
        query: &HansardQuery,
        range: &DateRange,
    ) -> Result<Vec<RawRecord>, ClientError> {
        let records = self.fetch_hansard(query).await?;
        Ok(range.apply(records))
    }

    pub async fn fetch_debates(&self, query: &DebatesQuery) -> Result<Vec<RawRecord>, ClientError> {
        let params = query.to_params()?;
        let data = self.call("getDebates", params).await?;
        decode_rows(unwrap_rows(data, "rows"))
    }

    pub async fn fetch_members(&self, query: &MembersQuery) -> Result<Vec<Member>, ClientError> {
        let params = query.to_params()?;
        let data = self.call(query.chamber.members_function(), params).await?;
        decode_rows(unwrap_rows(data, "rows"))
    }

    pub async fn fetch_senator(&self, id: &str) -> Result<Option<Member>, ClientError> {
        let params = crate::query::senator_params(id)?;
        let data = self.call("getSenator", params).await?;
        decode_single(data)
    }

    pub async fn fetch_representative(
        &self,
        query: &RepresentativeQuery,
    ) -> Result<Option<Member>, ClientError> {
        let params = query.to_params()?;
        let data = self.call("getRepresentative", params).await?;
        decode_single(data)
    }

    pub async fn fetch_comments(&self, query: &CommentsQuery) -> Result<Vec<Comment>, ClientError> {
        let params = query.to_params()?;
        let data = self.call("getComments", params).await?;
        decode_rows(unwrap_rows(data, "comments"))
    }

    pub async fn fetch_divisions(&self, query: &DivisionsQuery) -> Result<Vec<Division>, ClientError> {
        let params = query.to_params()?;
        let data = self.call("getDivisions", params).await?;
        decode_rows(unwrap_rows(data, "rows"))
    }

    async fn call(&self, function: &str, params: Params) -> Result<Value, ClientError> {
        let url = self.endpoint(function, &params)?;
        log::info!("Calling {} with {} option(s)...", function, params.len());

        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, crate::USER_AGENT)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("{} returned HTTP {}", function, status);
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(ClientError::Auth(format!("{function} returned {status}")));
            }
            return Err(ClientError::Status {
                status,
                function: function.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        parse_body(&body)
    }

    fn endpoint(&self, function: &str, params: &Params) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}/{}", self.api_url, function))
            .map_err(|e| ClientError::Validation(format!("Invalid API URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("output", "js")
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }
}

/// Unwraps the API's JSON envelope into its rows.
pub fn parse_envelope(body: &str) -> Result<Vec<Value>, ClientError> {
    Ok(unwrap_rows(parse_body(body)?, "rows"))
}

fn parse_body(body: &str) -> Result<Value, ClientError> {
    let mut data: Value =
        serde_json::from_str(body).inspect_err(|e| log::error!("JSON decode error: {e}"))?;

    if let Some(error) = data.as_object_mut().and_then(|map| map.remove("error")) {
        let message = match error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        log::error!("API error: {}", message);
        if is_credential_error(&message) {
            return Err(ClientError::Auth(message));
        }
        return Err(ClientError::Api(message));
    }
    Ok(data)
}

fn is_credential_error(message: &str) -> bool {
    let message = message.to_lowercase();
    CREDENTIAL_ERRORS.iter().any(|m| message.contains(m))
}

fn unwrap_rows(data: Value, key: &str) -> Vec<Value> {
    let rows = match data {
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        Value::Array(rows) => rows,
        _ => Vec::new(),
    };
    log::info!("Received {} row(s)", rows.len());
    rows
}

// Single-member lookups answer with an object, or a one-element array.
fn decode_single<T: DeserializeOwned>(data: Value) -> Result<Option<T>, ClientError> {
    let row = match data {
        Value::Object(map) if !map.is_empty() => Value::Object(map),
        Value::Array(rows) => match rows.into_iter().next() {
            Some(row) => row,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(serde_json::from_value(row)?))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ClientError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClientError::from))
        .collect()
}
