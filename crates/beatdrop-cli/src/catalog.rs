//! Catalog backed by a JSON dump of song records.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use beatdrop_songlist::pagination::{CatalogPage, PageRequest};
use beatdrop_songlist::runtime::CatalogSource;
use beatdrop_songlist::RawSongRecord;
use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::info;

/// Reads either a bare array of records or an object with a `songs` array.
pub fn parse_records(content: &str) -> anyhow::Result<Vec<Value>> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("songs") {
            Some(Value::Array(records)) => Ok(records),
            _ => anyhow::bail!("expected a JSON array or an object with a \"songs\" array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a \"songs\" array"),
    }
}

pub struct JsonCatalog {
    records: Arc<Vec<Value>>,
}

impl JsonCatalog {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let records = parse_records(&content)?;
        info!("[catalog] {} records from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }
}

impl CatalogSource for JsonCatalog {
    fn fetch_page(&self, request: PageRequest) -> BoxFuture<'static, anyhow::Result<CatalogPage>> {
        let records = Arc::clone(&self.records);
        Box::pin(async move {
            let page = records
                .iter()
                .skip(request.offset)
                .take(request.limit)
                .cloned()
                .map(RawSongRecord::from_value)
                .collect();
            Ok(CatalogPage {
                records: page,
                total: records.len(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatdrop_songlist::pagination::PageKind;
    use serde_json::json;

    #[test]
    fn test_parse_records_accepts_both_layouts() {
        assert_eq!(parse_records(r#"[{"hash":"a"}]"#).unwrap().len(), 1);
        assert_eq!(parse_records(r#"{"songs":[{"hash":"a"},{"hash":"b"}]}"#).unwrap().len(), 2);
        assert!(parse_records(r#"{"items":[]}"#).is_err());
    }

    #[tokio::test]
    async fn test_last_page_is_short() {
        let catalog = JsonCatalog::from_records((0..5).map(|i| json!({ "hash": i.to_string() })).collect());
        let page = catalog
            .fetch_page(PageRequest {
                generation: 1,
                offset: 4,
                limit: 20,
                kind: PageKind::More,
            })
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total, 5);
    }
}
