use swampstudy_server::email::{EmailService, HttpEmailService};
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test_log::test(tokio::test)]
async fn test_http_email_posts_provider_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .and(header("authorization", "Bearer test_key"))
        .and(body_partial_json(serde_json::json!({
            "From": "noreply@swampstudy.test",
            "To": "albert@ufl.edu",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let svc = HttpEmailService::new(
        format!("{}/email", server.uri()),
        "test_key".to_string(),
        "noreply@swampstudy.test".to_string(),
    );

    tokio_test::assert_ok!(
        svc.send_verification_code("albert@ufl.edu", "Albert", "123456")
            .await
    );
}

#[test_log::test(tokio::test)]
async fn test_http_email_surfaces_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let svc = HttpEmailService::new(
        server.uri(),
        "test_key".to_string(),
        "noreply@swampstudy.test".to_string(),
    );

    let result = svc
        .send_verification_code("albert@ufl.edu", "Albert", "123456")
        .await;
    assert!(result.is_err());
}
