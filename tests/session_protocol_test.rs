/// Protocol tests for sessions driven over an in-memory transport
///
/// These cover framing, single-flight and recovery behaviour without a
/// sqlite3 binary.

use serde::Deserialize;
use serde_json::json;
use sqlite_pipe::{named_params, params, BindError, Phase, ScriptedTransport, Session, ShellError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_zero_and_many_rows() {
    init_tracing();
    let transport = ScriptedTransport::new()
        .respond(Vec::<String>::new())
        .respond_rows(&[
            json!({"id": 1, "name": "a"}),
            json!({"id": 2, "name": null}),
            json!({"id": 3, "name": "c,]"}),
        ]);
    let session = Session::with_transport(transport).await.unwrap();

    let empty = session.query_all("SELECT * FROM t WHERE 0", ()).await.unwrap();
    assert!(empty.is_empty());

    let rows = session.query_all("SELECT id, name FROM t", ()).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id"], json!(1));
    assert_eq!(rows[1]["name"], json!(null));
    assert_eq!(rows[2]["name"], json!("c,]"));

    let columns: Vec<&String> = rows[0].keys().collect();
    assert_eq!(columns, vec!["id", "name"]);
}

#[tokio::test]
async fn test_abandoned_rows_release_and_drain() {
    init_tracing();
    let transport = ScriptedTransport::new()
        .respond_rows(&[json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])
        .respond_rows(&[json!({"n": 99})]);
    let log = transport.sent_log();
    let session = Session::with_transport(transport).await.unwrap();

    {
        let mut rows = session.query("SELECT n FROM t", ()).await.unwrap();
        let first = rows.next().await.unwrap().unwrap();
        assert_eq!(first["n"], json!(1));
        assert_eq!(session.state(), Phase::Busy);
    }
    assert_eq!(session.state(), Phase::Idle);

    // leftovers of the abandoned result must not leak into this one
    let rows = session.query_all("SELECT 99 AS n", ()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["n"], json!(99));
    assert_eq!(log.len(), 2);
}

#[tokio::test]
async fn test_malformed_row_then_recovery() {
    init_tracing();
    let transport = ScriptedTransport::new()
        .respond(["[{\"ok\":1},", "not json,", "{\"ok\":3}]"])
        .respond_rows(&[json!({"ok": true})]);
    let session = Session::with_transport(transport).await.unwrap();

    let err = session.query_all("SELECT ok FROM t", ()).await.unwrap_err();
    match err {
        ShellError::MalformedRow { line, .. } => assert_eq!(line, "not json"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(session.state(), Phase::Idle);

    let rows = session.query_all("SELECT true AS ok", ()).await.unwrap();
    assert_eq!(rows[0]["ok"], json!(true));
}

#[tokio::test]
async fn test_binding_is_checked_before_io() {
    let transport = ScriptedTransport::new();
    let log = transport.sent_log();
    let session = Session::with_transport(transport).await.unwrap();

    let err = session.execute("SELECT ?", params![1, 2]).await.unwrap_err();
    assert!(matches!(
        err,
        ShellError::Bind(BindError::UnconsumedParameters { .. })
    ));

    let err = session
        .execute("SELECT :a, :b", named_params! { "a" => 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShellError::Bind(BindError::MissingNamedParameter { ref key }) if key == "b"
    ));

    assert!(log.is_empty());
    session.execute("SELECT ?", params![1]).await.unwrap();
    assert_eq!(log.entries(), vec!["SELECT 1;\n.print *\n".to_string()]);
}

#[tokio::test]
async fn test_unparameterized_sql_is_forwarded_verbatim() {
    let transport = ScriptedTransport::new();
    let log = transport.sent_log();
    let session = Session::with_transport(transport).await.unwrap();

    session.execute("SELECT '?' || ?", ()).await.unwrap();
    assert_eq!(log.last().as_deref(), Some("SELECT '?' || ?;\n.print *\n"));
}

#[derive(Debug, Deserialize, PartialEq)]
struct Measurement {
    id: i64,
    value: f64,
    label: Option<String>,
}

#[tokio::test]
async fn test_typed_rows() {
    let transport = ScriptedTransport::new().respond_rows(&[
        json!({"id": 1, "value": 1.5, "label": "x"}),
        json!({"id": 2, "value": 2.25, "label": null}),
    ]);
    let session = Session::with_transport(transport).await.unwrap();

    let rows: Vec<Measurement> = session
        .query_all_as("SELECT id, value, label FROM m", ())
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            Measurement { id: 1, value: 1.5, label: Some("x".into()) },
            Measurement { id: 2, value: 2.25, label: None },
        ]
    );
}

#[tokio::test]
async fn test_query_one_leaves_session_clean() {
    let transport = ScriptedTransport::new()
        .respond_rows(&[json!({"n": 1}), json!({"n": 2})])
        .respond_rows(&[json!({"n": 3})]);
    let session = Session::with_transport(transport).await.unwrap();

    let first = session.query_one("SELECT n FROM t", ()).await.unwrap().unwrap();
    assert_eq!(first["n"], json!(1));
    let next = session.query_one("SELECT 3 AS n", ()).await.unwrap().unwrap();
    assert_eq!(next["n"], json!(3));
}

#[tokio::test]
async fn test_exit_directive_then_close() {
    init_tracing();
    let transport = ScriptedTransport::new().respond_exit(3);
    let session = Session::with_transport(transport).await.unwrap();

    session.execute(".exit 3", ()).await.unwrap();
    assert_eq!(session.state(), Phase::Idle);
    assert!(matches!(
        session.close().await,
        Err(ShellError::AbnormalExit { code: Some(3) })
    ));
}

#[tokio::test]
async fn test_shared_session_rejects_concurrent_statement() {
    let transport = ScriptedTransport::new().respond_rows(&[json!({"n": 1})]);
    let session = std::sync::Arc::new(Session::with_transport(transport).await.unwrap());

    let mut rows = session.query_raw("SELECT n FROM t", ()).await.unwrap();

    let other = session.clone();
    let rejected = tokio::spawn(async move { other.execute("SELECT 2", ()).await })
        .await
        .unwrap();
    assert!(matches!(rejected, Err(ShellError::AlreadyExecuting)));

    assert_eq!(rows.drain().await.unwrap(), 1);
    let other = session.clone();
    tokio::spawn(async move { other.execute("SELECT 2", ()).await })
        .await
        .unwrap()
        .unwrap();
}
