use irisdesk::Config;
use irisdesk::session::Console;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn config_file_drives_endpoints_and_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/run"))
        .and(body_json(json!({"prompt": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[backend]\nbase_url = \"{}/api\"\ncommand_path = \"v2/run\"\n\n[console]\nrequest_text_field = \"prompt\"\nsend_aliases = false\n",
            server.uri()
        ),
    )
    .unwrap();

    let config = Config::load_or_init_at(&config_path).unwrap();
    let console = Console::from_config(&config).unwrap();
    let report = console
        .submit("hello", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(report.response.display_text.as_deref(), Some("hi"));
}
