//! Integration tests for the record services against a mock instance.

use std::future::Future;
use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::{Method, Request, Response};
use serde_json::json;
use servicenow::models::{ChangeRequest, Incident, Record, StandardChangeTemplate};
use servicenow::options::{
    CreateOptions, DeleteOptions, DisplayValue, Filter, GetOptions, ListOptions, UpdateOptions,
};
use servicenow::{
    BasicAuthTransport, Canceller, Context, ContextError, NowError, ServiceNowClient, Sink,
    Transport,
};
use wiremock::{
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> ServiceNowClient {
    ServiceNowClient::new(&server.uri(), BasicAuthTransport::new("user", "pass")).expect("client")
}

fn records(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "records": value }))
}

/// Test that list sends the options and the JSONv2 marker.
#[tokio::test]
async fn test_list_incidents_sends_options() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .and(query_param("sysparm_record_count", "10"))
        .and(query_param("displayvalue", "true"))
        .and(query_param("sysparm_query", "active=true+priority!=5"))
        .and(query_param("JSONv2", ""))
        .and(query_param_is_missing("sysparm_action"))
        .respond_with(records(json!([
            {"number": "INC0010001", "sys_id": "a1"},
            {"number": "INC0010002", "sys_id": "a2"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let opts = ListOptions::new()
        .with_limit(10)
        .with_display_value(DisplayValue::True)
        .with_filter(Filter::eq("active", "true"))
        .with_filter(Filter::ne("priority", "5"));

    let incidents = client_for(&server)
        .incidents()
        .list(&Context::background(), opts)
        .await
        .expect("list");

    let numbers: Vec<_> = incidents.iter().filter_map(Incident::number).collect();
    assert_eq!(numbers, vec!["INC0010001", "INC0010002"]);
}

/// Test that HTTP Basic credentials reach the server.
#[tokio::test]
async fn test_basic_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/change_request.do"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .and(header("Accept", "application/json"))
        .respond_with(records(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let changes = client_for(&server)
        .change_requests()
        .list(&Context::background(), ListOptions::new())
        .await
        .expect("list");

    assert!(changes.is_empty());
}

/// Test that get selects by number and keeps the base path.
#[tokio::test]
async fn test_get_change_request_by_number() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/change_request.do"))
        .and(query_param("sysparm_query", "number=CHG0030001"))
        .and(query_param("JSONv2", ""))
        .respond_with(records(json!([{
            "number": "CHG0030001",
            "type": "standard",
            "u_custom": "kept"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ServiceNowClient::new(
        &format!("{}/api", server.uri()),
        BasicAuthTransport::new("user", "pass"),
    )
    .expect("client");

    let change = client
        .change_requests()
        .get(&Context::background(), "CHG0030001", GetOptions::new())
        .await
        .expect("get");

    assert_eq!(change.number.as_deref(), Some("CHG0030001"));
    assert_eq!(change.change_type.as_deref(), Some("standard"));
    assert_eq!(change.extra.get("u_custom"), Some(&json!("kept")));
}

/// Test that an empty identifier fails before any request is made.
#[tokio::test]
async fn test_empty_number_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(records(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(records(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = Context::background();

    let err = client
        .incidents()
        .get(&ctx, "", GetOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, NowError::Validation(_)));
    assert_eq!(err.to_string(), "validation error: incident number cannot be empty");

    let err = client
        .incidents()
        .update(&ctx, "", &Incident::default(), UpdateOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, NowError::Validation(_)));

    let err = client
        .change_requests()
        .delete(&ctx, "", DeleteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, NowError::Validation(_)));
}

/// Test that no matching record yields an empty record, not an error.
#[tokio::test]
async fn test_get_missing_record_is_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .respond_with(records(json!([])))
        .mount(&server)
        .await;

    let incident = client_for(&server)
        .incidents()
        .get(&Context::background(), "INC9999999", GetOptions::new())
        .await
        .expect("get");

    assert_eq!(incident, Incident::default());
}

/// Test that an empty envelope from a write yields an empty record.
#[tokio::test]
async fn test_writes_with_empty_envelope_return_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/incident.do"))
        .respond_with(records(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let ctx = Context::background();
    let incident = Incident {
        short_description: Some("Mail server down".to_string()),
        ..Default::default()
    };

    let created = client
        .incidents()
        .create(&ctx, &incident, CreateOptions::new())
        .await
        .expect("create");
    assert_eq!(created, Incident::default());

    let updated = client
        .incidents()
        .update(&ctx, "INC0010001", &incident, UpdateOptions::new())
        .await
        .expect("update");
    assert_eq!(updated, Incident::default());
}

/// Test that a null records list is treated as empty.
#[tokio::test]
async fn test_null_records_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/change_request.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": null })))
        .mount(&server)
        .await;

    let change = client_for(&server)
        .change_requests()
        .get(&Context::background(), "CHG0030001", GetOptions::new())
        .await
        .expect("get");

    assert_eq!(change, ChangeRequest::default());
}

/// Test that create posts only the set fields with sysparm_action=insert.
#[tokio::test]
async fn test_create_incident() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/incident.do"))
        .and(query_param("sysparm_action", "insert"))
        .and(query_param("JSONv2", ""))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "short_description": "Mail server down",
            "urgency": ""
        })))
        .respond_with(records(json!([{
            "number": "INC0010003",
            "sys_id": "c3",
            "short_description": "Mail server down",
            "__status": "success"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let incident = Incident {
        short_description: Some("Mail server down".to_string()),
        urgency: Some(String::new()),
        ..Default::default()
    };

    let created = client_for(&server)
        .incidents()
        .create(&Context::background(), &incident, CreateOptions::new())
        .await
        .expect("create");

    assert_eq!(created.number(), Some("INC0010003"));
    assert_eq!(created.status.as_deref(), Some("success"));
}

/// Test that update selects by number with sysparm_action=update.
#[tokio::test]
async fn test_update_incident() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/incident.do"))
        .and(query_param("sysparm_action", "update"))
        .and(query_param("sysparm_query", "number=INC0010001"))
        .and(body_json(json!({ "state": "6" })))
        .respond_with(records(json!([{ "number": "INC0010001", "state": "6" }])))
        .expect(1)
        .mount(&server)
        .await;

    let changes = Incident {
        state: Some("6".to_string()),
        ..Default::default()
    };

    let updated = client_for(&server)
        .incidents()
        .update(
            &Context::background(),
            "INC0010001",
            &changes,
            UpdateOptions::new(),
        )
        .await
        .expect("update");

    assert_eq!(updated.state.as_deref(), Some("6"));
}

/// Test that delete identifies the record by sys_id.
#[tokio::test]
async fn test_delete_template() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/std_change_proposal.do"))
        .and(query_param("sysparm_action", "deleteRecord"))
        .and(query_param("sysparm_sys_id", "0123abcd"))
        .respond_with(records(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let echoed = client_for(&server)
        .standard_change_templates()
        .delete(&Context::background(), "0123abcd", DeleteOptions::new())
        .await
        .expect("delete");

    assert_eq!(echoed, StandardChangeTemplate::default());
}

/// Test that an empty 200 body is not an error.
#[tokio::test]
async fn test_empty_body_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let incidents = client_for(&server)
        .incidents()
        .list(&Context::background(), ListOptions::new())
        .await
        .expect("list");

    assert!(incidents.is_empty());
}

/// Test that malformed JSON is a decode error.
#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"records\": ["))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .incidents()
        .list(&Context::background(), ListOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NowError::Decode { .. }), "got {:?}", err);
}

/// Test that 401 maps to an authentication error.
#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("User Not Authenticated"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .incidents()
        .get(&Context::background(), "INC0010001", GetOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NowError::Authentication));
}

/// Test that server errors carry the status and a truncated body.
#[tokio::test]
async fn test_server_error_is_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .change_requests()
        .create(
            &Context::background(),
            &ChangeRequest::default(),
            CreateOptions::new(),
        )
        .await
        .unwrap_err();

    match err {
        NowError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.ends_with("...[truncated]"));
            assert!(body.len() < 2000);
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

/// Test that the raw body can be copied into a writer.
#[tokio::test]
async fn test_execute_into_sink() {
    let server = MockServer::start().await;
    let raw = r#"{"records":[{"number":"INC0010001"}]}"#;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .respond_with(ResponseTemplate::new(200).set_body_string(raw))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .new_request(Method::GET, "incident.do?JSONv2=", None::<&()>)
        .expect("request");

    let mut sink = Sink(Vec::new());
    let response = client
        .execute(&Context::background(), request, &mut sink)
        .await
        .expect("execute");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(String::from_utf8(sink.0).unwrap(), raw);
}

/// Test that an error response leaves the sink empty.
#[tokio::test]
async fn test_error_status_does_not_fill_sink() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incident.do"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = client
        .new_request(Method::GET, "incident.do?JSONv2=", None::<&()>)
        .expect("request");

    let mut sink = Sink(Vec::new());
    let err = client
        .execute(&Context::background(), request, &mut sink)
        .await
        .unwrap_err();

    match err {
        NowError::HttpStatus { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "Internal error");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(sink.0.is_empty());
}

/// Test that a passed deadline aborts a slow request.
#[tokio::test]
async fn test_deadline_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(records(json!([])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let err = client_for(&server)
        .incidents()
        .list(&ctx, ListOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
}

/// Test that an already cancelled context sends nothing.
#[tokio::test]
async fn test_cancelled_before_send() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(records(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (ctx, canceller) = Context::with_cancel();
    canceller.cancel();

    let err = client_for(&server)
        .incidents()
        .list(&ctx, ListOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.context_error(), Some(ContextError::Cancelled));
}

/// Transport that cancels its context, then fails to connect.
struct CancelThenFail {
    canceller: Canceller,
    inner: reqwest::Client,
}

impl Transport for CancelThenFail {
    fn round_trip(
        &self,
        request: &Request,
    ) -> impl Future<Output = Result<Response, NowError>> + Send {
        self.canceller.cancel();
        self.inner.round_trip(request)
    }
}

/// Test that a context cancelled while the send is being set up aborts it.
#[tokio::test]
async fn test_cancelled_while_sending() {
    let (ctx, canceller) = Context::with_cancel();
    let transport = CancelThenFail {
        canceller,
        inner: reqwest::Client::new(),
    };
    let client = ServiceNowClient::new("http://127.0.0.1:1", transport).expect("client");

    let err = client
        .incidents()
        .get(&ctx, "INC0010001", GetOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.context_error(), Some(ContextError::Cancelled));
}

/// Transport whose send cancels the context and then fails in the same poll.
struct FailAfterCancel {
    canceller: Canceller,
}

impl Transport for FailAfterCancel {
    fn round_trip(
        &self,
        _request: &Request,
    ) -> impl Future<Output = Result<Response, NowError>> + Send {
        async move {
            self.canceller.cancel();
            Err(NowError::StreamingBody)
        }
    }
}

/// Test that cancellation wins over the transport error it caused.
#[tokio::test]
async fn test_cancellation_takes_precedence_over_transport_error() {
    let (ctx, canceller) = Context::with_cancel();
    let client = ServiceNowClient::new("http://127.0.0.1:1", FailAfterCancel { canceller })
        .expect("client");

    let err = client
        .change_requests()
        .update(
            &ctx,
            "CHG0030001",
            &ChangeRequest::default(),
            UpdateOptions::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, NowError::Context(ContextError::Cancelled)), "got {:?}", err);
}

/// Test that client_secret never surfaces in transport errors.
#[tokio::test]
async fn test_transport_error_redacts_client_secret() {
    let client = ServiceNowClient::new("http://127.0.0.1:1", reqwest::Client::new())
        .expect("client");
    let request = client
        .new_request(
            Method::GET,
            "oauth_token.do?client_secret=s3cr3t-value&grant_type=password",
            None::<&()>,
        )
        .expect("request");

    let err = client
        .execute(&Context::background(), request, &mut ())
        .await
        .unwrap_err();

    assert!(matches!(err, NowError::Transport(_)), "got {:?}", err);
    let message = format!("{} {:?}", err, err);
    assert!(!message.contains("s3cr3t-value"));
}
