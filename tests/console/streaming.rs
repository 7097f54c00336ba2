use super::backend::console_for;
use irisdesk::governance::GovernanceState;
use irisdesk::session::{ChatItemKind, MessageRole, MessageStatus};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn system_texts(console: &irisdesk::session::Console) -> Vec<(String, MessageStatus)> {
    console
        .snapshot()
        .into_iter()
        .filter_map(|item| match item.kind {
            ChatItemKind::Message {
                role: MessageRole::System,
                text,
                status,
            } => Some((text, status)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn event_stream_deltas_concatenate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"delta\":\"Hel\"}\n\ndata: {\"delta\":\"lo\"}\n\ndata: [DONE]\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let report = console
        .submit("greet me", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(report.response.display_text.as_deref(), Some("Hello"));
    assert_eq!(
        system_texts(&console),
        [("Hello".to_string(), MessageStatus::Final)]
    );
}

#[tokio::test]
async fn ndjson_stream_with_trailing_envelope() {
    let body = concat!(
        "{\"delta\":\"Drafting\"}\n",
        "{\"text\":\" done\"}\n",
        "{\"summary\":\"Draft ready\",\"proposed_commands\":[{\"command\":\"create_page\"}]}\n"
    );
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let report = console
        .submit("draft", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(
        system_texts(&console),
        [("Drafting done".to_string(), MessageStatus::Final)]
    );
    let card = report.response.governance.unwrap();
    assert_eq!(card.state(), GovernanceState::Blocked);
    assert_eq!(card.summary(), Some("Draft ready"));
    assert!(report.governance_item.is_some());
}

#[tokio::test]
async fn internal_lines_are_removed_after_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: Executor: sandbox-3\ndata: All set.\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let console = console_for(&server);
    console
        .submit("status", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        system_texts(&console),
        [("All set.".to_string(), MessageStatus::Final)]
    );
}

#[tokio::test]
async fn proposals_survive_trailing_metadata_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                "data: {\"delta\":\"Here is a plan\"}\n\n",
                "data: {\"proposed_commands\":[{\"command\":\"create_page\"}]}\n\n",
                "data: {\"event\":\"end\",\"usage\":{\"tokens\":42}}\n\n",
                "data: [DONE]\n\n"
            ),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let report = console
        .submit("plan", &CancellationToken::new())
        .await
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(report.response.proposals.len(), 1);
    let card = report.response.governance.unwrap();
    assert_eq!(card.state(), GovernanceState::Blocked);
    assert_eq!(card.proposals().len(), 1);
}
