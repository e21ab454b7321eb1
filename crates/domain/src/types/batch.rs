//! Batch endpoint wire types
//!
//! A batch request carries up to thirty items, each tagged with a caller
//! chosen `bId`. The response echoes the ids, one item per request, each
//! holding an entity, a query result, or a fault.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::entities::{Entity, EntityKind};
use super::fault::Fault;
use super::query::QueryResponse;
use crate::errors::{Result, TallyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOperation {
    Create,
    Update,
    Delete,
}

crate::impl_wire_name_conversions!(BatchOperation {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOption {
    Void,
}

crate::impl_wire_name_conversions!(BatchOption {
    Void => "void",
});

#[derive(Debug, Clone, PartialEq)]
pub enum BatchPayload {
    Entity { kind: EntityKind, value: Value },
    Query(String),
}

/// One operation inside a batch call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemRequest {
    pub b_id: String,
    pub operation: Option<BatchOperation>,
    pub options_data: Option<BatchOption>,
    pub payload: BatchPayload,
}

impl BatchItemRequest {
    fn for_entity<T: Entity>(
        b_id: impl Into<String>,
        operation: BatchOperation,
        entity: &T,
    ) -> Result<Self> {
        let value = serde_json::to_value(entity)
            .map_err(|e| TallyError::InvalidRequest(format!("cannot serialize {}: {e}", T::KIND)))?;
        Ok(Self {
            b_id: b_id.into(),
            operation: Some(operation),
            options_data: None,
            payload: BatchPayload::Entity { kind: T::KIND, value },
        })
    }

    /// # Errors
    /// Returns `TallyError::InvalidRequest` if the entity cannot be serialized.
    pub fn create<T: Entity>(b_id: impl Into<String>, entity: &T) -> Result<Self> {
        Self::for_entity(b_id, BatchOperation::Create, entity)
    }

    /// # Errors
    /// Returns `TallyError::InvalidRequest` if the entity cannot be serialized.
    pub fn update<T: Entity>(b_id: impl Into<String>, entity: &T) -> Result<Self> {
        Self::for_entity(b_id, BatchOperation::Update, entity)
    }

    /// # Errors
    /// Returns `TallyError::InvalidRequest` if the entity cannot be serialized.
    pub fn delete<T: Entity>(b_id: impl Into<String>, entity: &T) -> Result<Self> {
        Self::for_entity(b_id, BatchOperation::Delete, entity)
    }

    /// Void a transaction: an update carrying the `void` option.
    ///
    /// # Errors
    /// Returns `TallyError::InvalidRequest` if the entity cannot be serialized.
    pub fn void<T: Entity>(b_id: impl Into<String>, entity: &T) -> Result<Self> {
        let mut item = Self::for_entity(b_id, BatchOperation::Update, entity)?;
        item.options_data = Some(BatchOption::Void);
        Ok(item)
    }

    pub fn query(b_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            b_id: b_id.into(),
            operation: None,
            options_data: None,
            payload: BatchPayload::Query(query.into()),
        }
    }
}

impl Serialize for BatchItemRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.operation.is_some()) + usize::from(self.options_data.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("bId", &self.b_id)?;
        if let Some(operation) = self.operation {
            map.serialize_entry("operation", operation.as_str())?;
        }
        if let Some(option) = self.options_data {
            map.serialize_entry("optionsData", option.as_str())?;
        }
        match &self.payload {
            BatchPayload::Entity { kind, value } => map.serialize_entry(kind.as_str(), value)?,
            BatchPayload::Query(query) => map.serialize_entry("Query", query)?,
        }
        map.end()
    }
}

/// `{"BatchItemRequest": [...]}`
#[derive(Debug, Serialize)]
pub struct BatchRequestBody<'a> {
    #[serde(rename = "BatchItemRequest")]
    pub items: &'a [BatchItemRequest],
}

/// `{"BatchItemResponse": [...], "time": "..."}`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BatchResponseBody {
    #[serde(rename = "BatchItemResponse", default)]
    pub items: Vec<BatchItemResponse>,
    #[serde(default)]
    pub time: Option<String>,
}

/// What a single batch item resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Entity { kind: EntityKind, value: Value },
    Query(QueryResponse),
    Fault(Fault),
    /// An object under a key that names no modelled kind.
    Unrecognized { key: String, value: Value },
    /// The item carried nothing besides its `bId`.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct BatchItemResponse {
    pub b_id: String,
    pub outcome: BatchOutcome,
}

impl BatchItemResponse {
    /// The returned entity, if this item holds one of `T`'s kind.
    ///
    /// # Errors
    /// Returns `TallyError::Decode` when the object does not match `T`.
    pub fn entity<T: Entity>(&self) -> Result<Option<T>> {
        match &self.outcome {
            BatchOutcome::Entity { kind, value } if *kind == T::KIND => {
                Ok(Some(T::deserialize(value)?))
            }
            _ => Ok(None),
        }
    }

    pub const fn query(&self) -> Option<&QueryResponse> {
        match &self.outcome {
            BatchOutcome::Query(response) => Some(response),
            _ => None,
        }
    }

    pub const fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            BatchOutcome::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    pub const fn is_fault(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Fault(_))
    }
}

impl TryFrom<Map<String, Value>> for BatchItemResponse {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let b_id = match map.remove("bId") {
            Some(Value::String(id)) => id,
            Some(other) => return Err(format!("bId is not a string: {other}")),
            None => return Err("batch item has no bId".to_string()),
        };

        let outcome = if let Some(fault) = map.remove("Fault") {
            BatchOutcome::Fault(serde_json::from_value(fault).map_err(|e| e.to_string())?)
        } else if let Some(query) = map.remove("QueryResponse") {
            BatchOutcome::Query(serde_json::from_value(query).map_err(|e| e.to_string())?)
        } else if let Some(kind) = map.keys().find_map(|key| EntityKind::from_wire(key)) {
            let value = map.remove(kind.as_str()).unwrap_or_default();
            BatchOutcome::Entity { kind, value }
        } else if let Some((key, value)) = map.into_iter().next() {
            BatchOutcome::Unrecognized { key, value }
        } else {
            BatchOutcome::Empty
        };

        Ok(Self { b_id, outcome })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::entities::{Customer, Invoice};
    use crate::types::transactions::Estimate;

    #[test]
    fn test_request_serialization() {
        let customer = Customer { display_name: Some("Amy".into()), ..Customer::default() };
        let item = BatchItemRequest::create("b1", &customer).unwrap();
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "bId": "b1", "operation": "create", "Customer": { "DisplayName": "Amy" } })
        );

        let query = BatchItemRequest::query("q", "SELECT * FROM Term");
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "bId": "q", "Query": "SELECT * FROM Term" })
        );
    }

    #[test]
    fn test_void_is_update_with_option() {
        let invoice = Invoice { id: Some("9".into()), sync_token: Some("2".into()), ..Invoice::default() };
        let item = BatchItemRequest::void("v", &invoice).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["operation"], "update");
        assert_eq!(value["optionsData"], "void");
        assert_eq!(value["Invoice"]["Id"], "9");
    }

    #[test]
    fn test_response_outcomes() {
        let body: BatchResponseBody = serde_json::from_value(json!({
            "BatchItemResponse": [
                { "bId": "1", "Customer": { "Id": "61", "DisplayName": "Amy" } },
                { "bId": "2", "QueryResponse": { "Customer": [{ "Id": "1" }], "startPosition": 1 } },
                { "bId": "3", "Fault": { "type": "ValidationFault", "Error": [{ "Message": "Duplicate", "code": "6240" }] } },
                { "bId": "4" },
                { "bId": "5", "Estimate": { "Id": "9", "TxnStatus": "Pending" } },
                { "bId": "6", "SalesReceipt": { "Id": "12" } }
            ],
            "time": "2024-01-01T00:00:00-08:00"
        }))
        .unwrap();

        let items = body.items;
        assert_eq!(items.len(), 6);

        let customer = items[0].entity::<Customer>().unwrap().unwrap();
        assert_eq!(customer.id.as_deref(), Some("61"));
        assert!(items[0].entity::<Invoice>().unwrap().is_none());

        assert_eq!(items[1].query().unwrap().items::<Customer>().unwrap().len(), 1);

        assert!(items[2].is_fault());
        assert_eq!(items[2].fault().unwrap().first().unwrap().code.as_deref(), Some("6240"));

        assert_eq!(items[3].outcome, BatchOutcome::Empty);
        assert_eq!(items[3].b_id, "4");

        let estimate = items[4].entity::<Estimate>().unwrap().unwrap();
        assert_eq!(estimate.txn_status.as_deref(), Some("Pending"));

        assert_eq!(
            items[5].outcome,
            BatchOutcome::Unrecognized { key: "SalesReceipt".into(), value: json!({ "Id": "12" }) }
        );
        assert!(items[5].entity::<Customer>().unwrap().is_none());
    }

    #[test]
    fn test_missing_bid_is_rejected() {
        let result: std::result::Result<BatchItemResponse, _> =
            serde_json::from_value(json!({ "Customer": {} }));
        assert!(result.is_err());
    }
}
