use std::{collections::HashMap, sync::Arc};

use httpmock::prelude::*;
use serde_json::json;
use todo_sync_core::{IssueTracker, RepoRef, SourceLines, TodoRecord};
use todo_sync_engine::{ItemAction, ItemOutcome, ReconcileConfig, ReconcileError, Reconciler};
use todo_sync_github::{GithubApiClient, GithubClientConfig};

fn github_tracker(server: &MockServer) -> Arc<dyn IssueTracker> {
    let client = GithubApiClient::new(GithubClientConfig {
        api_base: server.base_url(),
        token: "test-token".to_string(),
        issue_repo: RepoRef::parse("acme/tracker").expect("repo"),
        code_repo: RepoRef::parse("acme/engine").expect("repo"),
        request_timeout_ms: 3_000,
        retry_max_attempts: 1,
        retry_base_delay_ms: 1,
    })
    .expect("client");
    Arc::new(client)
}

fn config() -> ReconcileConfig {
    let mut config = ReconcileConfig::new(
        RepoRef::parse("acme/engine").expect("repo"),
        RepoRef::parse("acme/tracker").expect("repo"),
        "f00dcafe",
    );
    config.branch = "main".to_string();
    config.per_page = 1;
    config.comment_on_close = true;
    config.assign_from_blame = true;
    config
}

fn todo(title: &str, line: usize, commit: Option<&str>) -> TodoRecord {
    TodoRecord {
        title: title.to_string(),
        body: "Found during review.".to_string(),
        file: "src/lib.rs".to_string(),
        line,
        commit_hash: commit.map(ToOwned::to_owned),
        committer_email: Some("dev@example.com".to_string()),
        kind: "TODO".to_string(),
        ..TodoRecord::default()
    }
}

fn lines() -> Arc<dyn SourceLines> {
    Arc::new(HashMap::from([("src/lib.rs".to_string(), 120usize)]))
}

#[tokio::test]
async fn integration_github_flow_pages_closes_creates_and_assigns() {
    let server = MockServer::start();
    let next_link = format!(
        "<{}/repos/acme/tracker/issues?labels=todo&state=all&per_page=1&page=2>; rel=\"next\"",
        server.base_url()
    );
    let page_one = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/tracker/issues")
            .query_param("page", "1")
            .query_param("per_page", "1");
        then.status(200).header("link", next_link.as_str()).json_body(json!([
            {
                "id": 501,
                "number": 5,
                "title": "keep the matched todo around",
                "state": "open",
                "labels": [{ "name": "todo" }]
            }
        ]));
    });
    let page_two = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/tracker/issues")
            .query_param("page", "2");
        then.status(200).json_body(json!([
            {
                "id": 601,
                "number": 6,
                "title": "vanished todo from last week",
                "state": "open",
                "labels": [{ "name": "todo" }, { "name": "branch: main" }]
            }
        ]));
    });
    let comment = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/tracker/issues/6/comments")
            .json_body(json!({ "body": "Closed in commit acme/engine@f00dcafe" }));
        then.status(201).json_body(json!({ "id": 1 }));
    });
    let close = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/tracker/issues/6")
            .json_body(json!({ "state": "closed" }));
        then.status(200).json_body(json!({
            "id": 601,
            "number": 6,
            "title": "vanished todo from last week",
            "state": "closed",
            "labels": []
        }));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/tracker/issues")
            .json_body(json!({
                "title": "brand new todo from this commit",
                "body": "Found during review.\n\nAuthor: dev@example.com\nLine: 40\nhttps://github.com/acme/engine/blob/f00dcafe/src/lib.rs#L37-L47",
                "labels": ["todo"]
            }));
        then.status(201).json_body(json!({
            "id": 701,
            "number": 7,
            "title": "brand new todo from this commit",
            "state": "open",
            "labels": [{ "name": "todo" }]
        }));
    });
    let commit = server.mock(|when, then| {
        when.method(GET).path("/repos/acme/engine/commits/c0ffee");
        then.status(200)
            .json_body(json!({ "sha": "c0ffee", "author": { "login": "octocat" } }));
    });
    let assign = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/tracker/issues/7")
            .json_body(json!({ "assignees": ["octocat"] }));
        then.status(200).json_body(json!({
            "id": 701,
            "number": 7,
            "title": "brand new todo from this commit",
            "state": "open",
            "labels": []
        }));
    });

    let summary = Reconciler::new(github_tracker(&server), config())
        .run(
            vec![
                todo("keep the matched todo around", 10, Some("c0ffee")),
                todo("brand new todo from this commit", 40, Some("c0ffee")),
            ],
            lines(),
        )
        .await
        .expect("run");

    page_one.assert();
    page_two.assert();
    comment.assert();
    close.assert();
    create.assert();
    commit.assert();
    assign.assert();
    assert_eq!(summary.managed_issues, 2);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.commented, 1);
    assert_eq!(summary.assigned, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn integration_github_item_failures_are_reported_not_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/tracker/issues");
        then.status(200).json_body(json!([]));
    });
    let create_rejected = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/tracker/issues")
            .body_includes("rejected by validation");
        then.status(422).json_body(json!({ "message": "Validation Failed" }));
    });
    let create_ok = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/tracker/issues")
            .body_includes("accepted after the failure");
        then.status(201).json_body(json!({
            "id": 801,
            "number": 8,
            "title": "accepted after the failure",
            "state": "open",
            "labels": []
        }));
    });
    let commit_missing = server.mock(|when, then| {
        when.method(GET).path("/repos/acme/engine/commits/badbad");
        then.status(404).json_body(json!({ "message": "No commit found" }));
    });
    let assign = server.mock(|when, then| {
        when.method(PATCH).path("/repos/acme/tracker/issues/8");
        then.status(200);
    });

    let summary = Reconciler::new(github_tracker(&server), config())
        .run(
            vec![
                todo("rejected by validation", 3, None),
                todo("accepted after the failure", 9, Some("badbad")),
            ],
            lines(),
        )
        .await
        .expect("item failures do not abort the run");

    create_rejected.assert();
    create_ok.assert();
    commit_missing.assert();
    assert_eq!(assign.hits(), 0);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 2);
    let failed_create = summary
        .items
        .iter()
        .find(|item| item.action == ItemAction::Create && item.title == "rejected by validation")
        .expect("failed create item");
    match &failed_create.outcome {
        ItemOutcome::Failed(cause) => assert!(cause.contains("422"), "{cause}"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn integration_github_listing_failure_on_later_page_aborts_run() {
    let server = MockServer::start();
    let next_link = format!(
        "<{}/repos/acme/tracker/issues?page=2>; rel=\"next\"",
        server.base_url()
    );
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/tracker/issues")
            .query_param("page", "1");
        then.status(200).header("link", next_link.as_str()).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/tracker/issues")
            .query_param("page", "2");
        then.status(500).body("boom");
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/tracker/issues");
        then.status(201);
    });

    let error = Reconciler::new(github_tracker(&server), config())
        .run(vec![todo("never created on failure", 1, None)], lines())
        .await
        .expect_err("listing failure is fatal");

    assert!(matches!(error, ReconcileError::IssueListing { page: 2, .. }));
    assert_eq!(create.hits(), 0);
}
