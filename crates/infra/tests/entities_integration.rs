//! Integration tests for typed entity operations
//!
//! **Coverage:**
//! - Create, read, full and sparse update with the current sync token
//! - Delete (including already-deleted objects) and void
//! - Queries, counts and paged listings
//! - Company info, customer lookup by name, document delivery and change
//!   data capture

mod support;

use chrono::{FixedOffset, TimeZone};
use serde_json::json;
use support::{client_for, company_path, ctx, REALM};
use tallyline_domain::{
    CompanyInfo, Customer, EntityKind, Estimate, Invoice, ReferenceType, TallyError, Term,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIME: &str = "2024-05-01T10:00:00-07:00";

async fn mount_current_customer(server: &MockServer, sync_token: &str) {
    Mock::given(method("GET"))
        .and(path(company_path("customer/61")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Customer": { "Id": "61", "SyncToken": sync_token, "DisplayName": "Amy's Bird Sanctuary" },
            "time": TIME
        })))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Create / Read / Update
// ============================================================================

#[tokio::test]
async fn test_create_returns_server_entity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(company_path("customer")))
        .and(body_partial_json(json!({ "DisplayName": "Cool Cars" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Customer": { "Id": "62", "SyncToken": "0", "DisplayName": "Cool Cars" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let draft = Customer { display_name: Some("Cool Cars".into()), ..Customer::default() };
    let created = client.entities().create(&ctx(), &draft).await.unwrap();

    assert_eq!(created.id.as_deref(), Some("62"));
    assert_eq!(created.sync_token.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_find_by_id_and_missing_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path("term/3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Term": { "Id": "3", "SyncToken": "0", "Name": "Net 30", "DueDays": 30 },
            "time": TIME
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(company_path("term/4")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "time": TIME })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let term: Term = client.entities().find_by_id(&ctx(), "3").await.unwrap();
    assert_eq!(term.name.as_deref(), Some("Net 30"));

    let missing = client.entities().find_by_id::<Term>(&ctx(), "4").await.unwrap_err();
    assert!(matches!(missing, TallyError::Decode(_)));

    let empty = client.entities().find_by_id::<Term>(&ctx(), " ").await.unwrap_err();
    assert!(matches!(empty, TallyError::InvalidRequest(_)));
}

/// Validates that a full update carries the server's current sync token.
///
/// # Test Steps
/// 1. Serve the customer with sync token 3
/// 2. Update a local copy holding a stale token
/// 3. Verify the POST body carries token 3
#[tokio::test]
async fn test_update_uses_current_sync_token() {
    let server = MockServer::start().await;
    mount_current_customer(&server, "3").await;
    Mock::given(method("POST"))
        .and(path(company_path("customer")))
        .and(body_partial_json(json!({ "Id": "61", "SyncToken": "3", "DisplayName": "Amy's Aviary" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Customer": { "Id": "61", "SyncToken": "4", "DisplayName": "Amy's Aviary" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stale = Customer {
        id: Some("61".into()),
        sync_token: Some("0".into()),
        display_name: Some("Amy's Aviary".into()),
        ..Customer::default()
    };
    let updated = client.entities().update(&ctx(), &stale).await.unwrap();

    assert_eq!(updated.sync_token.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_sparse_update_sets_flag() {
    let server = MockServer::start().await;
    mount_current_customer(&server, "7").await;
    Mock::given(method("POST"))
        .and(path(company_path("customer")))
        .and(body_partial_json(json!({ "Id": "61", "SyncToken": "7", "sparse": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Customer": { "Id": "61", "SyncToken": "8" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let change = Customer { id: Some("61".into()), notes: Some("VIP".into()), ..Customer::default() };
    let updated = client.entities().sparse_update(&ctx(), &change).await.unwrap();

    assert_eq!(updated.sync_token.as_deref(), Some("8"));
}

#[tokio::test]
async fn test_update_without_id_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let client = client_for(&server);
    let err = client.entities().update(&ctx(), &Customer::default()).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));
}

// ============================================================================
// Delete / Void
// ============================================================================

#[tokio::test]
async fn test_delete_posts_with_operation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(company_path("invoice")))
        .and(query_param("operation", "delete"))
        .and(body_partial_json(json!({ "Id": "130", "SyncToken": "2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": { "Id": "130", "status": "Deleted", "domain": "QBO" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invoice = Invoice { id: Some("130".into()), sync_token: Some("2".into()), ..Invoice::default() };
    client.entities().delete(&ctx(), &invoice).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_missing_object_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Fault": {
                "Error": [{ "Message": "Object Not Found", "Detail": "Object Not Found : Something you're trying to use has been made inactive.", "code": "610" }],
                "type": "ValidationFault"
            },
            "time": TIME
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invoice = Invoice { id: Some("130".into()), sync_token: Some("2".into()), ..Invoice::default() };
    client.entities().delete(&ctx(), &invoice).await.unwrap();
}

#[tokio::test]
async fn test_delete_requires_id_and_sync_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let client = client_for(&server);
    let no_token = Invoice { id: Some("130".into()), ..Invoice::default() };
    let err = client.entities().delete(&ctx(), &no_token).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));

    let no_id = Invoice { sync_token: Some("2".into()), ..Invoice::default() };
    let err = client.entities().delete(&ctx(), &no_id).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_void_fetches_token_then_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path("invoice/130")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": { "Id": "130", "SyncToken": "5", "CustomerRef": { "value": "3" } },
            "time": TIME
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(company_path("invoice")))
        .and(query_param("operation", "void"))
        .and(body_partial_json(json!({ "Id": "130", "SyncToken": "5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": { "Id": "130", "SyncToken": "6", "PrivateNote": "Voided" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let invoice = Invoice {
        id: Some("130".into()),
        customer_ref: ReferenceType::new("3"),
        ..Invoice::default()
    };
    client.entities().void(&ctx(), &invoice).await.unwrap();
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_query_returns_rows_or_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path("query")))
        .and(query_param("query", "SELECT * FROM Customer WHERE Active = true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResponse": {
                "Customer": [{ "Id": "1", "DisplayName": "Amy" }, { "Id": "2", "DisplayName": "Bill" }],
                "startPosition": 1,
                "maxResults": 2
            },
            "time": TIME
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(company_path("query")))
        .and(query_param("query", "SELECT * FROM Customer WHERE Active = false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "QueryResponse": {}, "time": TIME })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let active: Vec<Customer> =
        client.entities().query(&ctx(), "SELECT * FROM Customer WHERE Active = true").await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[1].display_name.as_deref(), Some("Bill"));

    let inactive: Vec<Customer> =
        client.entities().query(&ctx(), "SELECT * FROM Customer WHERE Active = false").await.unwrap();
    assert!(inactive.is_empty());
}

/// Validates paged listing of every object.
///
/// # Test Steps
/// 1. Report 2,100 terms from the count query
/// 2. Serve three pages addressed by start position
/// 3. Verify all rows are concatenated in page order
#[tokio::test]
async fn test_find_all_pages_through_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT COUNT(*) FROM Term"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResponse": { "totalCount": 2100 },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    for (start, ids) in [(1, ["1", "2"]), (1001, ["1001", "1002"]), (2001, ["2001", "2002"])] {
        let query = format!("SELECT * FROM Term ORDERBY Id STARTPOSITION {start} MAXRESULTS 1000");
        let rows: Vec<_> = ids.iter().map(|id| json!({ "Id": id })).collect();
        Mock::given(method("GET"))
            .and(query_param("query", query.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "QueryResponse": { "Term": rows, "startPosition": start, "maxResults": 2 },
                "time": TIME
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let terms: Vec<Term> = client.entities().find_all(&ctx()).await.unwrap();

    let ids: Vec<_> = terms.iter().filter_map(|t| t.id.as_deref()).collect();
    assert_eq!(ids, ["1", "2", "1001", "1002", "2001", "2002"]);
}

#[tokio::test]
async fn test_find_all_stops_on_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT COUNT(*) FROM Customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResponse": { "totalCount": 5000 },
            "time": TIME
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT * FROM Customer ORDERBY Id STARTPOSITION 1 MAXRESULTS 1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResponse": { "Customer": [{ "Id": "1" }] },
            "time": TIME
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT * FROM Customer ORDERBY Id STARTPOSITION 1001 MAXRESULTS 1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "QueryResponse": {}, "time": TIME })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT * FROM Customer ORDERBY Id STARTPOSITION 2001 MAXRESULTS 1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "QueryResponse": {}, "time": TIME })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let customers: Vec<Customer> = client.entities().find_all(&ctx()).await.unwrap();
    assert_eq!(customers.len(), 1);
}

#[tokio::test]
async fn test_count_without_total_is_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "QueryResponse": {}, "time": TIME })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.entities().count::<Invoice>(&ctx()).await.unwrap(), 0);
    assert!(client.entities().find_all::<Invoice>(&ctx()).await.unwrap().is_empty());
}

// ============================================================================
// Company / Customer Lookup / Delivery / Change Data Capture
// ============================================================================

#[tokio::test]
async fn test_company_info_uses_realm_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path(&format!("companyinfo/{REALM}"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CompanyInfo": { "Id": "1", "SyncToken": "4", "CompanyName": "Sandbox Company_US_1", "Country": "US" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let info: CompanyInfo = client.entities().company_info(&ctx()).await.unwrap();
    assert_eq!(info.company_name.as_deref(), Some("Sandbox Company_US_1"));
}

/// Validates the company settings update.
///
/// # Test Steps
/// 1. Serve the current record with sync token 4
/// 2. Submit a change that carries a stale id and token
/// 3. Verify the sparse body uses the current id and token
#[tokio::test]
async fn test_update_company_info_is_sparse_with_current_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path(&format!("companyinfo/{REALM}"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CompanyInfo": { "Id": "1", "SyncToken": "4", "CompanyName": "Sandbox Company_US_1" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(company_path("companyinfo")))
        .and(body_partial_json(json!({
            "Id": "1",
            "SyncToken": "4",
            "LegalName": "Sandbox Holdings LLC",
            "sparse": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CompanyInfo": { "Id": "1", "SyncToken": "5", "LegalName": "Sandbox Holdings LLC" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let change = CompanyInfo {
        id: Some("99".into()),
        sync_token: Some("0".into()),
        legal_name: Some("Sandbox Holdings LLC".into()),
        ..CompanyInfo::default()
    };
    let updated = client.entities().update_company_info(&ctx(), &change).await.unwrap();
    assert_eq!(updated.sync_token.as_deref(), Some("5"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert!(body.get("CompanyName").is_none());
}

#[tokio::test]
async fn test_find_customer_by_name_escapes_quotes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT * FROM Customer WHERE DisplayName = 'Amy''s Bird Sanctuary'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResponse": { "Customer": [{ "Id": "1", "DisplayName": "Amy's Bird Sanctuary" }] },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "SELECT * FROM Customer WHERE DisplayName = 'Nobody'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "QueryResponse": {}, "time": TIME })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let found = client.entities().find_customer_by_name(&ctx(), "Amy's Bird Sanctuary").await.unwrap();
    assert_eq!(found.and_then(|c| c.id).as_deref(), Some("1"));

    let missing = client.entities().find_customer_by_name(&ctx(), "Nobody").await.unwrap();
    assert!(missing.is_none());

    let err = client.entities().find_customer_by_name(&ctx(), "").await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_send_invoice_with_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(company_path("invoice/130/send")))
        .and(query_param("sendTo", "billing@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": { "Id": "130", "SyncToken": "3", "EmailStatus": "EmailSent" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sent = client
        .entities()
        .send::<Invoice>(&ctx(), "130", Some("billing@example.com"))
        .await
        .unwrap();
    assert_eq!(sent.sync_token.as_deref(), Some("3"));

    let err = client.entities().send::<Invoice>(&ctx(), "", None).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_send_invoice_without_address_omits_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(company_path("invoice/130/send")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Invoice": { "Id": "130", "SyncToken": "3" },
            "time": TIME
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.entities().send::<Invoice>(&ctx(), "130", None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query_pairs().all(|(key, _)| key != "sendTo"));
}

#[tokio::test]
async fn test_send_estimate_uses_estimate_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(company_path("estimate/41/send")))
        .and(query_param("sendTo", "buyer@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Estimate": { "Id": "41", "SyncToken": "1", "EmailStatus": "EmailSent", "CustomerRef": { "value": "3" } },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sent: Estimate =
        client.entities().send(&ctx(), "41", Some("buyer@example.com")).await.unwrap();
    assert_eq!(sent.email_status.as_deref(), Some("EmailSent"));
}

#[tokio::test]
async fn test_send_rejects_kinds_without_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.entities().send::<Customer>(&ctx(), "61", None).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(ref m) if m.contains("Customer")));
}

#[tokio::test]
async fn test_void_estimate_with_current_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path("estimate/41")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Estimate": { "Id": "41", "SyncToken": "2", "CustomerRef": { "value": "3" } },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(company_path("estimate")))
        .and(query_param("operation", "void"))
        .and(body_partial_json(json!({ "Id": "41", "SyncToken": "2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Estimate": { "Id": "41", "SyncToken": "3", "TxnStatus": "Closed" },
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let estimate = Estimate { id: Some("41".into()), ..Estimate::default() };
    client.entities().void(&ctx(), &estimate).await.unwrap();
}

#[tokio::test]
async fn test_change_data_capture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(company_path("cdc")))
        .and(query_param("entities", "Customer,Invoice"))
        .and(query_param("changedSince", "2024-05-01T08:00:00-07:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CDCResponse": [{
                "QueryResponse": [
                    { "Customer": [{ "Id": "61", "SyncToken": "4" }, { "Id": "62", "status": "Deleted" }] },
                    { "Invoice": [{ "Id": "130", "SyncToken": "6" }] }
                ]
            }],
            "time": TIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
    let since = pacific.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    let changes = client
        .entities()
        .change_data_capture(&ctx(), &[EntityKind::Customer, EntityKind::Invoice], &since)
        .await
        .unwrap();

    let customers = changes.changes::<Customer>().unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[1].status.as_deref(), Some("Deleted"));
    assert_eq!(changes.changes::<Invoice>().unwrap().len(), 1);

    let err = client.entities().change_data_capture(&ctx(), &[], &since).await.unwrap_err();
    assert!(matches!(err, TallyError::InvalidRequest(_)));
}
