use crate::error::RemoteError;
use catalog_sync_models::{ItemId, RawRecord};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Error body returned by the service, e.g.
/// `{"code":"42P01","message":"relation \"public.movies\" does not exist"}`
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

fn id_filter(id: ItemId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

pub async fn list_rows(client: &Client, table_url: &str, table: &str) -> Result<Vec<RawRecord>, RemoteError> {
    let response = client
        .get(table_url)
        .query(&[("select", "*"), ("order", "created_at.desc")])
        .send()
        .await?;

    let rows: Vec<RawRecord> = read_rows(response, table).await?;
    debug!("Fetched {} rows from {}", rows.len(), table);
    Ok(rows)
}

pub async fn insert_row(
    client: &Client,
    table_url: &str,
    table: &str,
    record: &RawRecord,
) -> Result<RawRecord, RemoteError> {
    let response = client
        .post(table_url)
        .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
        .json(&[record])
        .send()
        .await?;

    read_rows(response, table)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::Validation(format!("insert into {} returned no row", table)))
}

pub async fn update_row(
    client: &Client,
    table_url: &str,
    table: &str,
    id: ItemId,
    patch: &RawRecord,
) -> Result<RawRecord, RemoteError> {
    let response = client
        .patch(table_url)
        .query(&id_filter(id))
        .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
        .json(patch)
        .send()
        .await?;

    // An update that matched nothing comes back as an empty array
    read_rows(response, table)
        .await?
        .into_iter()
        .next()
        .ok_or(RemoteError::NotFound(id))
}

pub async fn delete_row(client: &Client, table_url: &str, table: &str, id: ItemId) -> Result<(), RemoteError> {
    let response = client.delete(table_url).query(&id_filter(id)).send().await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    let outcome = delete_outcome(status, &body, table);
    match outcome {
        Ok(()) => debug!("Row {} was already gone from {}", id, table),
        Err(ref e) => warn!("Delete of {} from {} failed with {}: {}", id, table, status, e),
    }
    outcome
}

/// A failed DELETE. A 404 for a row that is already gone counts as done;
/// a 404 naming a missing table does not.
pub fn delete_outcome(status: StatusCode, body: &str, table: &str) -> Result<(), RemoteError> {
    if status == StatusCode::NOT_FOUND && !ServiceErrorBody::parse(body).names_missing_relation(status) {
        return Ok(());
    }
    Err(classify_failure(status, body, table))
}

async fn read_rows(response: Response, table: &str) -> Result<Vec<RawRecord>, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = classify_failure(status, &body, table);
        warn!("Request against {} failed with {}: {}", table, status, error);
        return Err(error);
    }

    let text = response.text().await?;
    serde_json::from_str::<Vec<RawRecord>>(&text)
        .map_err(|e| RemoteError::Connectivity(format!("unexpected response from {}: {}", table, e)))
}

impl ServiceErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn message_or(&self, status: StatusCode) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status))
    }

    fn names_missing_relation(&self, status: StatusCode) -> bool {
        let message = self.message_or(status);
        matches!(self.code.as_deref(), Some("42P01") | Some("PGRST205"))
            || message.contains("does not exist")
            || message.contains("Could not find the table")
    }
}

/// Map a failed HTTP exchange onto the remote error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str, table: &str) -> RemoteError {
    let parsed = ServiceErrorBody::parse(body);

    if parsed.names_missing_relation(status) || status == StatusCode::NOT_FOUND {
        return RemoteError::SchemaMissing(table.to_string());
    }

    let message = parsed.message_or(status);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteError::Validation(message)
        }
        _ => RemoteError::Connectivity(message),
    }
}
