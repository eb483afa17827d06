use std::time::Duration;

use ferry_engine::{FailureKind, RenderSettings, Renderer, ReqwestRenderer};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn renderer(settings: RenderSettings) -> ReqwestRenderer {
    ReqwestRenderer::new(settings).expect("client builds")
}

#[tokio::test]
async fn renders_html_with_configured_user_agent() {
    ferry_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seasonal/TSA-POB"))
        .and(header("user-agent", "ferry-test/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>schedule</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let settings = RenderSettings {
        user_agent: "ferry-test/1.0".into(),
        ..RenderSettings::default()
    };
    let url = format!("{}/seasonal/TSA-POB", server.uri());

    let html = renderer(settings)
        .render(&url, &CancellationToken::new())
        .await
        .expect("render ok");
    assert_eq!(html, "<html>schedule</html>");
}

#[tokio::test]
async fn decodes_declared_legacy_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"Caf\xe9".to_vec(), "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/latin1", server.uri());
    let html = renderer(RenderSettings::default())
        .render(&url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(html, "Café");
}

#[tokio::test]
async fn http_errors_carry_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = renderer(RenderSettings::default())
        .render(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn slow_pages_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = RenderSettings {
        request_timeout: Duration::from_millis(50),
        ..RenderSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = renderer(settings)
        .render(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_pages_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = RenderSettings {
        max_bytes: 10,
        ..RenderSettings::default()
    };
    let url = format!("{}/large", server.uri());
    let err = renderer(settings)
        .render(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let url = format!("{}/api", server.uri());
    let err = renderer(RenderSettings::default())
        .render(&url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/json".into()
        }
    );
}

#[tokio::test]
async fn cancellation_abandons_in_flight_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(10))
                .set_body_string("late"),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let url = format!("{}/hang", server.uri());
    let err = renderer(RenderSettings::default())
        .render(&url, &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn malformed_urls_fail_before_any_request() {
    let err = renderer(RenderSettings::default())
        .render("not a url", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
