//! Table service operations.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE, ETAG, HeaderMap, HeaderValue, IF_MATCH};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use abc_retail_core::ETag;

use super::{AzureStorageClient, Service, error_from_response};
use crate::backend::{TableBackend, TableRow, WriteReceipt, resource_url};
use crate::error::{Result, StorageError};

const JSON_MINIMAL_METADATA: &str = "application/json;odata=minimalmetadata";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

impl AzureStorageClient {
    fn table_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MINIMAL_METADATA));
        headers.insert("dataserviceversion", HeaderValue::from_static("3.0"));
        headers.insert(
            "maxdataserviceversion",
            HeaderValue::from_static("3.0;NetFx"),
        );
        headers
    }

    fn entity_url(&self, table: &str, partition_key: &str, row_key: &str) -> Result<url::Url> {
        let segment = format!(
            "{table}(PartitionKey='{}',RowKey='{}')",
            escape_key(partition_key),
            escape_key(row_key)
        );
        resource_url(&self.inner.account.table_endpoint, &[&segment])
    }
}

#[async_trait]
impl TableBackend for AzureStorageClient {
    async fn create_table_if_not_exists(&self, table: &str) -> Result<bool> {
        let url = resource_url(&self.inner.account.table_endpoint, &["Tables"])?;
        let mut headers = Self::table_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static("return-no-content"));
        let body = serde_json::to_vec(&serde_json::json!({ "TableName": table }))
            .map_err(|e| StorageError::InvalidInput(e.to_string()))?;

        let response = self
            .send(Service::Table, Method::POST, url, headers, Some(Bytes::from(body)))
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            _ => Err(error_from_response(response, &format!("table {table}")).await),
        }
    }

    async fn get_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<TableRow> {
        let url = self.entity_url(table, partition_key, row_key)?;
        let response = self
            .send(Service::Table, Method::GET, url, Self::table_headers(), None)
            .await?;

        if !response.status().is_success() {
            let resource = format!("{table}/{partition_key}/{row_key}");
            return Err(error_from_response(response, &resource).await);
        }

        let etag = etag_header(response.headers());
        let properties: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| StorageError::DataCorruption(format!("{table}: {e}")))?;
        let mut row = row_from_properties(properties)?;
        if row.etag.is_none() {
            row.etag = etag;
        }
        Ok(row)
    }

    async fn query_rows(&self, table: &str, partition_key: Option<&str>) -> Result<Vec<TableRow>> {
        let base = resource_url(&self.inner.account.table_endpoint, &[&format!("{table}()")])?;
        let filter = partition_key.map(|pk| format!("PartitionKey eq '{}'", escape_key(pk)));

        let mut rows = Vec::new();
        let mut continuation: Option<(String, Option<String>)> = None;

        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                if let Some(filter) = &filter {
                    query.append_pair("$filter", filter);
                }
                if let Some((next_pk, next_rk)) = &continuation {
                    query.append_pair("NextPartitionKey", next_pk);
                    if let Some(next_rk) = next_rk {
                        query.append_pair("NextRowKey", next_rk);
                    }
                }
            }
            if url.query() == Some("") {
                url.set_query(None);
            }

            let response = self
                .send(Service::Table, Method::GET, url, Self::table_headers(), None)
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response, &format!("table {table}")).await);
            }

            let headers = response.headers();
            continuation = header_string(headers, "x-ms-continuation-nextpartitionkey")
                .map(|pk| (pk, header_string(headers, "x-ms-continuation-nextrowkey")));

            let page: QueryResponse = response
                .json()
                .await
                .map_err(|e| StorageError::DataCorruption(format!("{table}: {e}")))?;
            for properties in page.value {
                rows.push(row_from_properties(properties)?);
            }

            if continuation.is_none() {
                break;
            }
        }

        Ok(rows)
    }

    async fn upsert_row(&self, table: &str, row: TableRow) -> Result<WriteReceipt> {
        let url = self.entity_url(table, &row.partition_key, &row.row_key)?;
        let mut headers = Self::table_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(etag) = &row.etag {
            let value = HeaderValue::from_str(etag.as_str())
                .map_err(|e| StorageError::InvalidInput(format!("invalid etag: {e}")))?;
            headers.insert(IF_MATCH, value);
        }
        let body = serde_json::to_vec(&row.properties)
            .map_err(|e| StorageError::InvalidInput(e.to_string()))?;

        let response = self
            .send(Service::Table, Method::PUT, url, headers, Some(Bytes::from(body)))
            .await?;

        if !response.status().is_success() {
            let resource = format!("{table}/{}/{}", row.partition_key, row.row_key);
            return Err(error_from_response(response, &resource).await);
        }

        let etag = etag_header(response.headers()).ok_or_else(|| {
            StorageError::DataCorruption(format!("{table}: write response missing ETag"))
        })?;
        Ok(WriteReceipt {
            timestamp: timestamp_from_etag(&etag),
            etag,
        })
    }

    async fn delete_row(&self, table: &str, partition_key: &str, row_key: &str) -> Result<()> {
        let url = self.entity_url(table, partition_key, row_key)?;
        let mut headers = Self::table_headers();
        headers.insert(IF_MATCH, HeaderValue::from_static("*"));

        let response = self
            .send(Service::Table, Method::DELETE, url, headers, None)
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let resource = format!("{table}/{partition_key}/{row_key}");
            Err(error_from_response(response, &resource).await)
        }
    }
}

/// Quote a key for use inside an OData literal.
fn escape_key(key: &str) -> String {
    key.replace('\'', "''")
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn etag_header(headers: &HeaderMap) -> Option<ETag> {
    header_string(headers, ETAG.as_str()).map(ETag::new)
}

/// Table etags embed the row timestamp: `W/"datetime'2024-01-01T00%3A00%3A00.1Z'"`.
fn timestamp_from_etag(etag: &ETag) -> Option<DateTime<Utc>> {
    let inner = etag.as_str().split("datetime'").nth(1)?.split('\'').next()?;
    let decoded = inner.replace("%3A", ":").replace("%3a", ":");
    DateTime::parse_from_rfc3339(&decoded)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Split a wire entity into keys, server metadata and plain properties.
fn row_from_properties(mut properties: Map<String, Value>) -> Result<TableRow> {
    let etag = match properties.remove("odata.etag") {
        Some(Value::String(tag)) => Some(ETag::new(tag)),
        _ => None,
    };
    let timestamp = match properties.remove("Timestamp") {
        Some(Value::String(ts)) => DateTime::parse_from_rfc3339(&ts)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    };
    properties.retain(|key, _| !key.starts_with("odata.") && !key.contains("@odata."));

    let key = |name: &str| -> Result<String> {
        properties
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| StorageError::DataCorruption(format!("entity missing {name}")))
    };
    let partition_key = key("PartitionKey")?;
    let row_key = key("RowKey")?;

    Ok(TableRow {
        partition_key,
        row_key,
        properties,
        etag,
        timestamp,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_escape_key_doubles_quotes() {
        assert_eq!(escape_key("O'Brien"), "O''Brien");
        assert_eq!(escape_key("plain"), "plain");
    }

    #[test]
    fn test_row_from_properties_strips_metadata() {
        let wire = json!({
            "odata.etag": "W/\"datetime'2026-10-19T10%3A00%3A00.5Z'\"",
            "odata.metadata": "https://acct.table.core.windows.net/$metadata#Orders/@Element",
            "PartitionKey": "Order",
            "RowKey": "o-1",
            "Timestamp": "2026-10-19T10:00:00.5Z",
            "OrderDate@odata.type": "Edm.DateTime",
            "OrderDate": "2026-10-18T08:30:00Z",
            "Quantity": 2
        });

        let row = row_from_properties(wire.as_object().cloned().unwrap()).unwrap();

        assert_eq!(row.partition_key, "Order");
        assert_eq!(row.row_key, "o-1");
        assert!(row.etag.is_some());
        assert!(row.timestamp.is_some());
        assert!(!row.properties.contains_key("Timestamp"));
        assert!(!row.properties.contains_key("odata.metadata"));
        assert!(!row.properties.contains_key("OrderDate@odata.type"));
        assert_eq!(row.properties["Quantity"], json!(2));
    }

    #[test]
    fn test_row_without_keys_is_corrupt() {
        let wire = json!({ "PartitionKey": "Order" });
        let err = row_from_properties(wire.as_object().cloned().unwrap()).unwrap_err();
        assert!(matches!(err, StorageError::DataCorruption(_)));
    }

    #[test]
    fn test_timestamp_from_etag() {
        let etag = ETag::new("W/\"datetime'2026-10-19T10%3A00%3A00.5Z'\"");
        let ts = timestamp_from_etag(&etag).unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-10-19T10:00:00.500+00:00");

        assert!(timestamp_from_etag(&ETag::new("W/\"1\"")).is_none());
    }
}
