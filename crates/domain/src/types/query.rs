//! Query and change-data-capture envelopes
//!
//! Both responses hold arrays keyed by entity name next to paging fields.
//! The arrays are kept as raw JSON keyed by [`EntityKind`] and decoded on
//! demand into the entity type the caller asks for. Keys naming a kind this
//! crate does not model are kept verbatim in `unrecognized`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::entities::{Entity, EntityKind};
use crate::errors::Result;

/// Body of a `SELECT` query response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct QueryResponse {
    pub start_position: Option<u64>,
    pub max_results: Option<u64>,
    /// Only present for `SELECT COUNT(*)` queries.
    pub total_count: Option<u64>,
    pub entities: BTreeMap<EntityKind, Vec<Value>>,
    /// Fields that are neither paging counters nor a modelled kind.
    pub unrecognized: BTreeMap<String, Value>,
}

impl QueryResponse {
    /// Decode the rows of `T`'s kind. Missing kinds yield an empty list.
    ///
    /// # Errors
    /// Returns `TallyError::Decode` when a row does not match `T`.
    pub fn items<T: Entity>(&self) -> Result<Vec<T>> {
        self.entities
            .get(&T::KIND)
            .map(|rows| {
                rows.iter().map(|row| T::deserialize(row).map_err(Into::into)).collect::<Result<Vec<T>>>()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Number of rows of `kind` in this page.
    pub fn len_of(&self, kind: EntityKind) -> usize {
        self.entities.get(&kind).map_or(0, Vec::len)
    }

    /// True when the page holds no rows, modelled or not.
    pub fn is_empty(&self) -> bool {
        self.entities.values().all(Vec::is_empty)
            && self.unrecognized.values().all(|v| v.as_array().map_or(true, Vec::is_empty))
    }
}

impl TryFrom<Map<String, Value>> for QueryResponse {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let mut response = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "startPosition" => response.start_position = as_count(&key, &value)?,
                "maxResults" => response.max_results = as_count(&key, &value)?,
                "totalCount" => response.total_count = as_count(&key, &value)?,
                other => {
                    let Some(kind) = EntityKind::from_wire(other) else {
                        response.unrecognized.insert(other.to_string(), value);
                        continue;
                    };
                    match value {
                        Value::Array(rows) => {
                            response.entities.insert(kind, rows);
                        }
                        Value::Null => {}
                        _ => return Err(format!("{other} is not an array")),
                    }
                }
            }
        }
        Ok(response)
    }
}

fn as_count(key: &str, value: &Value) -> std::result::Result<Option<u64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| format!("{key} is not a count")),
        _ => Err(format!("{key} is not a number")),
    }
}

/// `{"QueryResponse": {...}, "time": "..."}`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QueryEnvelope {
    #[serde(rename = "QueryResponse", default)]
    pub query_response: QueryResponse,
    #[serde(default)]
    pub time: Option<String>,
}

/// Response of the change-data-capture endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ChangeDataCapture {
    #[serde(rename = "CDCResponse", default)]
    pub responses: Vec<CdcResponse>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CdcResponse {
    #[serde(rename = "QueryResponse", default)]
    pub query_responses: Vec<QueryResponse>,
}

impl ChangeDataCapture {
    /// Every changed `T` across all response groups, in response order.
    ///
    /// Deleted objects appear with `status: "Deleted"` and only their id.
    ///
    /// # Errors
    /// Returns `TallyError::Decode` when a row does not match `T`.
    pub fn changes<T: Entity>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for response in &self.responses {
            for page in &response.query_responses {
                out.extend(page.items::<T>()?);
            }
        }
        Ok(out)
    }
}
