use std::path::{Path, PathBuf};

use ralph_sessions::{contains_completion_promise, extract_feedback, SessionStore};
use rusqlite::Connection;
use tempfile::TempDir;

/// Helper: create a temp conversation database with the kiro-cli schema.
fn create_test_db(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("data.sqlite3");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE conversations_v2 (
            key TEXT NOT NULL,
            conversation_id TEXT NOT NULL,
            value TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (key, conversation_id)
        )",
    )
    .unwrap();
    db_path
}

fn insert_conversation(db_path: &Path, key: &str, id: &str, value: &str, created_at: i64) {
    let conn = Connection::open(db_path).unwrap();
    conn.execute(
        "INSERT INTO conversations_v2 (key, conversation_id, value, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![key, id, value, created_at],
    )
    .unwrap();
}

fn session_json(id: &str, content: &str) -> String {
    serde_json::json!({
        "conversation_id": id,
        "next_message": null,
        "history": [
            {
                "user": { "content": { "Prompt": { "prompt": "Build something" } } },
                "assistant": {
                    "ToolUse": { "message_id": "msg-1", "content": "", "tool_uses": [] }
                }
            },
            {
                "user": { "content": { "ToolUseResults": { "tool_use_results": [] } } },
                "assistant": {
                    "Response": { "message_id": "msg-2", "content": content }
                }
            }
        ]
    })
    .to_string()
}

#[test]
fn test_read_latest_session() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    insert_conversation(
        &db_path,
        "/test/project",
        "test-session-123",
        &session_json(
            "test-session-123",
            "I have completed the task.\n\n<promise>TASK_COMPLETE</promise>",
        ),
        1_767_811_253,
    );

    let store = SessionStore::with_db_path(db_path);
    let record = store.latest_for_dir(Path::new("/test/project")).unwrap();

    assert_eq!(record.conversation_id, "test-session-123");
    assert_eq!(record.history.len(), 2);
    let text = record.last_assistant_text().unwrap();
    assert!(contains_completion_promise(text, "TASK_COMPLETE"));
    assert!(!contains_completion_promise(text, "DIFFERENT_PROMISE"));
}

#[test]
fn test_unknown_directory_returns_none() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    insert_conversation(
        &db_path,
        "/test/project",
        "s1",
        &session_json("s1", "working"),
        1000,
    );

    let store = SessionStore::with_db_path(db_path);
    assert!(store.latest_for_dir(Path::new("/unknown/directory")).is_none());
}

#[test]
fn test_missing_db_returns_none() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::with_db_path(dir.path().join("nonexistent.sqlite3"));
    assert!(store.latest_for_dir(Path::new("/test/project")).is_none());
}

#[test]
fn test_most_recent_session_wins() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    insert_conversation(
        &db_path,
        "/test",
        "old-session",
        &session_json("old-session", "Working..."),
        1000,
    );
    insert_conversation(
        &db_path,
        "/test",
        "new-session",
        &session_json("new-session", "Done! <promise>COMPLETE</promise>"),
        2000,
    );

    let store = SessionStore::with_db_path(db_path);
    let record = store.latest_for_dir(Path::new("/test")).unwrap();

    assert_eq!(record.conversation_id, "new-session");
    assert!(contains_completion_promise(
        record.last_assistant_text().unwrap(),
        "COMPLETE"
    ));
}

#[test]
fn test_malformed_payload_returns_none() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    insert_conversation(&db_path, "/test", "bad", "{not valid json", 1000);

    let store = SessionStore::with_db_path(db_path);
    assert!(store.latest_for_dir(Path::new("/test")).is_none());
}

#[test]
fn test_oversized_payload_returns_none() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    // Just over the 50 MB sanity ceiling; presumed corrupt before parsing.
    let huge = "x".repeat(51 * 1024 * 1024);
    insert_conversation(&db_path, "/test", "huge", &huge, 1000);

    let store = SessionStore::with_db_path(db_path);
    assert!(store.latest_for_dir(Path::new("/test")).is_none());
}

#[test]
fn test_payload_without_history_list_returns_none() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    insert_conversation(
        &db_path,
        "/test",
        "no-history",
        r#"{"conversation_id": "no-history", "history": "not a list"}"#,
        1000,
    );

    let store = SessionStore::with_db_path(db_path);
    assert!(store.latest_for_dir(Path::new("/test")).is_none());
}

#[test]
fn test_feedback_from_stored_session() {
    let dir = TempDir::new().unwrap();
    let db_path = create_test_db(&dir);
    let content = "Progress report.\n\
        <ralph-feedback>\n\
        <quality-assessment><score>8</score><summary>Nearly there.</summary></quality-assessment>\n\
        <next-steps>\n- finish docs\n- run lints\n</next-steps>\n\
        </ralph-feedback>";
    insert_conversation(&db_path, "/test", "fb", &session_json("fb", content), 1000);

    let store = SessionStore::with_db_path(db_path);
    let record = store.latest_for_dir(Path::new("/test")).unwrap();
    let feedback = extract_feedback(record.last_assistant_text().unwrap()).unwrap();

    assert_eq!(feedback.quality_score, Some(8));
    assert_eq!(feedback.quality_summary.as_deref(), Some("Nearly there."));
    assert_eq!(feedback.next_steps, vec!["finish docs", "run lints"]);
    assert!(feedback.improvements.is_empty());
}
