use std::time::Duration;

use serde_json::json;
use unmand::api::Environment;
use unmand::exfil::{ExfilClient, ExtractionApi, SubmitOptions};
use unmand::{Extraction, PollConfig, Poller, RetryConfig, Status, Submitter};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "secret-token";

fn fast_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(5),
        max_attempts: 10,
        timeout: None,
        suppress_output: true,
        retry: RetryConfig {
            max_retries: 1,
            base_delay_ms: 1,
        },
    }
}

fn client(server: &MockServer) -> ExfilClient {
    ExfilClient::with_base_url(TOKEN, server.uri()).unwrap()
}

#[tokio::test]
async fn submit_uploads_multipart_with_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/extractions"))
        .and(header("Authorization", TOKEN))
        .and(body_string_contains("%PDF-1.4"))
        .and(body_string_contains("name=\"source\""))
        .and(body_string_contains("name=\"model\""))
        .and(body_string_contains("model-v3"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"extractionGuid": "job-1", "status": "QUEUED"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let options = SubmitOptions::default()
        .with_file_name("invoice.pdf")
        .with_model("model-v3");
    let job = Submitter::new(&client)
        .submit_with(b"%PDF-1.4...", &options)
        .await
        .unwrap();

    assert_eq!(job.id(), "job-1");
    assert_eq!(job.status(), Status::Queued);
    assert!(job.result().is_none());
}

#[tokio::test]
async fn empty_submission_sends_nothing() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = Submitter::new(&client).submit(b"").await.unwrap_err();

    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_credential_on_submit_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/extractions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = Submitter::new(&client).submit(b"bytes").await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn submit_then_poll_until_finished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/extractions"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"extractionGuid": "job-1", "status": "QUEUED"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-1/data"))
        .and(header("Authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "STARTED"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-1/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "FINISHED", "pages": 3})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Submitter::new(&client).submit(b"%PDF-1.4...").await.unwrap();
    Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap();

    assert_eq!(job.status(), Status::Finished);
    let result = job.result().unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result["pages"], json!(3));
}

#[tokio::test]
async fn failed_extraction_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-2/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "FAILED"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("job-2", Status::Queued);
    Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap();

    assert_eq!(job.status(), Status::Failed);
    assert!(job.result().is_none());
}

#[tokio::test]
async fn unknown_extraction_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/missing/data"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("missing", Status::Queued);
    let err = Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(job.status(), Status::Queued);
}

#[tokio::test]
async fn auth_rejection_while_polling_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-3/data"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("job-3", Status::Processing);
    let err = Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap_err();

    assert!(err.is_auth());
}

#[tokio::test]
async fn server_error_is_remote_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-4/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("job-4", Status::Queued);
    let err = Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn malformed_status_body_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-5/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.fetch_status("job-5").await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn never_finishing_extraction_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/job-6/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PROCESSING"})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("job-6", Status::Queued);
    let config = PollConfig {
        max_attempts: 3,
        ..fast_config()
    };
    let err = Poller::with_config(&client, config)
        .poll(&mut job)
        .await
        .unwrap_err();

    assert!(err.is_poll_timeout());
    assert_eq!(job.status(), Status::Processing);
}

#[tokio::test]
async fn reserved_characters_in_id_stay_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extractions/x%3Fy%2Fz%23w/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "FINISHED", "pages": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut job = Extraction::new("x?y/z#w", Status::Queued);
    Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap();

    assert_eq!(job.status(), Status::Finished);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn credential_with_line_break_never_reaches_the_network() {
    let server = MockServer::start().await;

    let err = ExfilClient::with_base_url("tok\nen", server.uri()).unwrap_err();
    assert!(!err.is_transient());
    let err = unmand::UnmandError::from(err);
    assert!(err.is_validation());

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_service_is_transport_error_after_retries() {
    // Nothing listens on the discard port.
    let client = ExfilClient::with_base_url(TOKEN, "http://127.0.0.1:9").unwrap();
    let mut job = Extraction::new("job-7", Status::Queued);

    let err = Poller::with_config(&client, fast_config())
        .poll(&mut job)
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(job.status(), Status::Queued);
}

#[test]
fn test_and_production_are_distinct() {
    let test = ExfilClient::new(TOKEN, Environment::Test).unwrap();
    let prod = ExfilClient::new(TOKEN, Environment::Production).unwrap();
    assert_ne!(test.base_url(), prod.base_url());
}
