use super::backend::{console_for, draft_outreach_reply, last_card};
use irisdesk::DeskError;
use irisdesk::error::ApprovalError;
use irisdesk::governance::GovernanceState;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_commands(server: &MockServer, reply: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(server)
        .await;
}

#[tokio::test]
async fn selected_proposal_is_resubmitted_unchanged() {
    let exotic = json!({
        "commandType": "batch",
        "payload": {
            "operations": [
                {"op_id": "op_1", "intent": "create_goal", "properties": {"Name": "Q3", "Score": 1.25}},
                {"op_id": "op_2", "intent": "create_task", "properties": {"Goal": {"op_ref": "op_1"}, "Tags": []}}
            ]
        },
        "unicode": "naïve ✓",
        "nothing": null
    });
    let server = MockServer::start().await;
    mount_commands(
        &server,
        json!({"result": {"proposedCommands": [{"command": "skip_me"}, exotic.clone()]}}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .and(body_json(exotic.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approvalId": "ap-7"})))
        .expect(1)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    let report = console
        .submit("plan the quarter", &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();
    let proposals_item = report.governance_item.unwrap();

    let execution_item = console
        .create_execution(&proposals_item, 1, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    let items = console.snapshot();
    let original = items.iter().find(|i| i.id == proposals_item).unwrap();
    assert_eq!(original.card().unwrap().proposals()[1].to_payload(), exotic);

    let execution = items.iter().find(|i| i.id == execution_item).unwrap();
    let card = execution.card().unwrap();
    assert_eq!(card.state(), GovernanceState::Blocked);
    assert_eq!(card.approval_id(), Some("ap-7"));
}

#[tokio::test]
async fn approval_needs_explicit_id_then_completes() {
    let server = MockServer::start().await;
    mount_commands(&server, draft_outreach_reply()).await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"execution_id": "exec-1", "approval_id": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/approvals"))
        .and(body_json(json!({"approval_id": "abc"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"execution_state": "COMPLETED"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console
        .submit("Draft sales outreach email", &cancel)
        .await
        .unwrap();
    let proposals_item = last_card(&console).id;
    let execution_item = console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    let err = console
        .approve(&execution_item, None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeskError::Approval(ApprovalError::MissingApprovalId)
    ));

    console
        .approve(&execution_item, Some("abc"), &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    let item = last_card(&console);
    assert_eq!(item.id, execution_item);
    let card = item.card().unwrap();
    assert_eq!(card.state(), GovernanceState::Executed);
    assert_eq!(card.approval_id(), Some("abc"));
    assert_eq!(card.execution_id(), Some("exec-1"));
    assert_eq!(
        card.history(),
        [
            GovernanceState::Blocked,
            GovernanceState::Approved,
            GovernanceState::Executed
        ]
    );

    let again = console.approve(&execution_item, Some("abc"), &cancel).await;
    assert!(again.is_err(), "executed cards accept no further approval");
}

#[tokio::test]
async fn rejected_approval_leaves_card_blocked() {
    let server = MockServer::start().await;
    mount_commands(&server, draft_outreach_reply()).await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approval_id": "abc"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/approvals"))
        .respond_with(ResponseTemplate::new(403).set_body_string("approver lacks permission"))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console.submit("Draft", &cancel).await.unwrap();
    let proposals_item = last_card(&console).id;
    let execution_item = console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    let err = console
        .approve(&execution_item, Some("abc"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 403: approver lacks permission");
    assert_eq!(
        console.error().as_deref(),
        Some("HTTP 403: approver lacks permission")
    );
    assert_eq!(
        last_card(&console).card().unwrap().state(),
        GovernanceState::Blocked
    );
    assert!(!console.is_approving());
}

#[tokio::test]
async fn preview_edits_travel_with_the_approval() {
    let server = MockServer::start().await;
    mount_commands(&server, draft_outreach_reply()).await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approval_id": "ap-2"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "preview": {
                "operations": [{
                    "op_id": "op_1",
                    "intent": "create_page",
                    "db_key": "outreach",
                    "property_preview": {"Name": "Q3 email", "Status": ""},
                    "property_spec": {"Status": {"type": "select", "options": ["Draft", "Sent"]}}
                }]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/approvals"))
        .and(body_json(json!({
            "approval_id": "ap-2",
            "patches": [{"op_id": "op_1", "changes": {"Status": "Draft"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .expect(1)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console.submit("Draft", &cancel).await.unwrap();
    let proposals_item = last_card(&console).id;
    let execution_item = console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    console
        .open_preview(&execution_item, 0, &cancel)
        .await
        .unwrap();
    let preview = console.preview().unwrap();
    assert_eq!(preview.missing_fields(), ["Status"]);

    assert!(!console.edit_field("op_9", "Status", json!("Draft")).unwrap());
    assert!(console.edit_field("op_1", "Status", json!("Draft")).unwrap());

    console
        .approve(&execution_item, Some("ap-2"), &cancel)
        .await
        .unwrap();
    assert!(console.preview().is_none());
    assert_eq!(
        last_card(&console).card().unwrap().state(),
        GovernanceState::Approved
    );
}

#[tokio::test]
async fn proposal_numbers_are_resubmitted_exactly() {
    let proposal = r#"{"amt":0.1000000000000000055511151231257827,"command":"record_payment","id":123456789012345678901234}"#;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"{{"proposed_commands":[{proposal}]}}"#),
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .and(body_string(proposal))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approval_id": "ap-9"})))
        .expect(1)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console.submit("record it", &cancel).await.unwrap();
    let proposals_item = last_card(&console).id;
    console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();
}

#[tokio::test]
async fn error_issue_in_loosely_typed_preview_blocks_approval() {
    let server = MockServer::start().await;
    mount_commands(&server, draft_outreach_reply()).await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approval_id": "ap-3"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "operations": [{
                "op_id": 1,
                "property_preview": {"Name": "Q3 email"},
                "property_spec": {"Status": {"type": "select", "options": [{"name": "Draft"}]}}
            }],
            "validation": [
                {"op_id": 1, "field": "Status", "severity": "error", "code": "required", "message": "Status is required"},
                {"op_id": 1, "severity": "info", "code": "hint", "message": "Drafts are private"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/approvals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "approved"})))
        .expect(0)
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console.submit("Draft", &cancel).await.unwrap();
    let proposals_item = last_card(&console).id;
    let execution_item = console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();
    console
        .open_preview(&execution_item, 0, &cancel)
        .await
        .unwrap();
    assert_eq!(console.preview().unwrap().preview().error_count(), 1);

    let err = console
        .approve(&execution_item, Some("ap-3"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeskError::Approval(ApprovalError::BlockedByValidation { count: 1 })
    ));
    assert_eq!(
        last_card(&console).card().unwrap().state(),
        GovernanceState::Blocked
    );
}

#[tokio::test]
async fn unreadable_preview_is_reported() {
    let server = MockServer::start().await;
    mount_commands(&server, draft_outreach_reply()).await;
    Mock::given(method("POST"))
        .and(path("/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"approval_id": "ap-4"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/previews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"operations": ["op_1"]})))
        .mount(&server)
        .await;

    let console = console_for(&server);
    let cancel = CancellationToken::new();
    console.submit("Draft", &cancel).await.unwrap();
    let proposals_item = last_card(&console).id;
    let execution_item = console
        .create_execution(&proposals_item, 0, &cancel)
        .await
        .unwrap()
        .done()
        .unwrap();

    let err = console
        .open_preview(&execution_item, 0, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeskError::Approval(ApprovalError::MalformedPreview(_))
    ));
    assert!(console.preview().is_none());
    assert!(console.error().is_some());
}
