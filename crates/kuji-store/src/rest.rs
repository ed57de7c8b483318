//! PostgREST back end (e.g. a Supabase project).

use std::time::Duration;

use kuji_core::{DrawRecord, DrawStore, StoreError, StoredDraw, WriteMode};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

/// Table the draws are written to.
pub const DRAWS_TABLE: &str = "draws";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Draw store that posts batches to a PostgREST endpoint.
///
/// Success responses carry no body (`return=minimal`), so the reported row
/// count is the size of the accepted batch.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
    key: String,
    conflict_target: Option<String>,
}

impl RestStore {
    /// Creates a store for the project at `base_url` using the service key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, key: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("kuji-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url, key))
    }

    /// Creates a store around an existing client.
    pub fn with_client(client: Client, base_url: &str, key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{DRAWS_TABLE}", base_url.trim_end_matches('/')),
            key: key.into(),
            conflict_target: None,
        }
    }

    /// Names the unique columns merges resolve against, for tables whose
    /// uniqueness is not the primary key.
    #[must_use]
    pub fn with_conflict_target(mut self, columns: impl Into<String>) -> Self {
        self.conflict_target = Some(columns.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, records: &[DrawRecord], mode: WriteMode) -> RequestBuilder {
        let rows: Vec<StoredDraw<'_>> = records.iter().map(DrawRecord::to_stored).collect();
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", prefer(mode))
            .json(&rows);
        if let Some(columns) = &self.conflict_target {
            request = request.query(&[("on_conflict", columns)]);
        }
        request
    }
}

impl DrawStore for RestStore {
    async fn upsert_batch(
        &mut self,
        game_id: &str,
        records: &[DrawRecord],
        mode: WriteMode,
    ) -> Result<usize, StoreError> {
        let response = self
            .request(records, mode)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(game = game_id, ?mode, size = records.len(), %status, "rest batch accepted");
            return Ok(records.len());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify(status, body))
    }
}

fn prefer(mode: WriteMode) -> &'static str {
    match mode {
        WriteMode::Merge => "resolution=merge-duplicates,return=minimal",
        WriteMode::IgnoreDuplicates => "resolution=ignore-duplicates,return=minimal",
    }
}

/// Maps a failed response onto the store error classes.
fn classify(status: StatusCode, body: String) -> StoreError {
    if status == StatusCode::CONFLICT {
        StoreError::Conflict(body)
    } else {
        StoreError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use kuji_core::Draw;
    use serde_json::{json, Value};

    use super::*;

    fn store() -> RestStore {
        RestStore::with_client(Client::new(), "https://project.example.test/", "service-key")
    }

    fn records() -> Vec<DrawRecord> {
        vec![
            Draw::new(
                NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
                vec![58, 3, 15, 22, 41],
                Some(11),
            )
            .into_record("powerball"),
            Draw::new(
                NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
                vec![1, 2, 3, 4, 5],
                None,
            )
            .into_record("powerball"),
        ]
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        assert_eq!(
            store().endpoint(),
            "https://project.example.test/rest/v1/draws"
        );
    }

    #[test]
    fn merge_request_shape() {
        let request = store()
            .request(&records(), WriteMode::Merge)
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://project.example.test/rest/v1/draws"
        );
        let headers = request.headers();
        assert_eq!(headers["apikey"], "service-key");
        assert_eq!(headers["authorization"], "Bearer service-key");
        assert_eq!(headers["prefer"], "resolution=merge-duplicates,return=minimal");

        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!([
                {"game_id": "powerball", "draw_date": "2026-02-18", "numbers": [3, 15, 22, 41, 58], "bonus": 11},
                {"game_id": "powerball", "draw_date": "2026-02-16", "numbers": [1, 2, 3, 4, 5], "bonus": null}
            ])
        );
    }

    #[test]
    fn ignore_duplicates_request_and_conflict_target() {
        let request = store()
            .with_conflict_target("game_id,draw_date,numbers")
            .request(&records()[..1], WriteMode::IgnoreDuplicates)
            .build()
            .unwrap();

        assert_eq!(
            request.headers()["prefer"],
            "resolution=ignore-duplicates,return=minimal"
        );
        assert_eq!(
            request.url().query(),
            Some("on_conflict=game_id%2Cdraw_date%2Cnumbers")
        );
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify(StatusCode::CONFLICT, "duplicate key".into()),
            StoreError::Conflict("duplicate key".into())
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "bad jwt".into()),
            StoreError::Rejected {
                status: 401,
                body: "bad jwt".into()
            }
        );
    }
}
