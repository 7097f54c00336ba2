use super::backend::{config_for, console_for, draft_outreach_reply, last_card};
use irisdesk::DeskError;
use irisdesk::governance::GovernanceState;
use irisdesk::session::{ChatItemKind, Console, MessageStatus};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn draft_outreach_yields_one_blocked_card() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands"))
        .and(body_partial_json(json!({
            "text": "Draft sales outreach email",
            "input_text": "Draft sales outreach email"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_outreach_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let report = console
        .submit("Draft sales outreach email", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();

    let cards: Vec<_> = console
        .snapshot()
        .into_iter()
        .filter(|item| item.card().is_some())
        .collect();
    assert_eq!(cards.len(), 1);
    assert_eq!(Some(&cards[0].id), report.governance_item.as_ref());

    let card = cards[0].card().unwrap();
    assert_eq!(card.state(), GovernanceState::Blocked);
    assert!(card.title().contains("Proposals"));
    assert_eq!(card.summary(), Some("Draft ready"));
    assert_eq!(card.proposals().len(), 1);
    assert_eq!(card.proposals()[0].label(0), "create_page");
}

#[tokio::test]
async fn bearer_token_comes_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer desk-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.backend.api_key = Some("desk-secret".into());
    let console = Console::from_config(&config).unwrap();
    console
        .submit("ping", &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_primary_reply_falls_back_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/legacy/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_outreach_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.backend.fallback_command_path = Some("/legacy/commands".into());
    let console = Console::from_config(&config).unwrap();

    let report = console
        .submit("Draft sales outreach email", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();
    assert!(report.used_fallback);
    assert_eq!(
        last_card(&console).card().unwrap().state(),
        GovernanceState::Blocked
    );
}

#[tokio::test]
async fn terminal_primary_reply_is_never_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"execution_state": "FAILED"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/legacy/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "legacy"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.backend.fallback_command_path = Some("/legacy/commands".into());
    let console = Console::from_config(&config).unwrap();

    let report = console
        .submit("run it", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();
    assert!(!report.used_fallback);
    let card = last_card(&console);
    assert_eq!(card.card().unwrap().title(), "Execution failed");
}

#[tokio::test]
async fn server_error_is_shown_verbatim_and_retry_keeps_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("{\"detail\":\"planner crashed\"}"),
        )
        .mount(&server)
        .await;

    let console = console_for(&server);
    let err = console
        .submit("Draft sales outreach email", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DeskError::Transport(_)));
    assert_eq!(
        console.error().as_deref(),
        Some("HTTP 500: {\"detail\":\"planner crashed\"}")
    );

    let items = console.snapshot();
    assert_eq!(items.len(), 1, "failed submission leaves only the operator item");
    assert!(matches!(
        items[0].kind,
        ChatItemKind::Message {
            status: MessageStatus::Error,
            ..
        }
    ));

    assert_eq!(
        console.retry().as_deref(),
        Some("Draft sales outreach email")
    );
    assert!(console.error().is_none());
}

#[tokio::test]
async fn non_json_body_becomes_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Sure, done.\nAgent: router-7"))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let report = console
        .submit("hello", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(report.response.display_text.as_deref(), Some("Sure, done."));
    assert!(report.governance_item.is_none());
}

#[tokio::test]
async fn cancelled_submission_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "too late"}))
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = console.submit("slow one", &cancel).await.unwrap();
    assert!(outcome.is_cancelled());
    assert!(console.error().is_none());
    assert!(!console.is_submitting());
    assert_eq!(console.snapshot().len(), 1);
}
