//! `Database` behavior over a scripted in-memory connection.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use asupersync::runtime::RuntimeBuilder;
use targa::{
    Connection, ConnectionErrorKind, Cx, Database, DatabaseOptions, Error, FieldType, Model,
    ModelDefinition, Outcome, QueryError, QueryErrorKind, Result, Row, Value,
};

#[derive(Model, Debug, PartialEq)]
#[targa(table = "teams")]
struct Team {
    #[targa(primary_key)]
    id: i64,
    name: String,
    rating: Option<f64>,
}

enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(Error),
}

/// Replays queued replies in order and records every statement it sees.
#[derive(Default)]
struct ScriptedConnection {
    replies: Mutex<VecDeque<Reply>>,
    pings: Mutex<VecDeque<Outcome<(), Error>>>,
    statements: Mutex<Vec<String>>,
    ping_count: AtomicUsize,
}

impl ScriptedConnection {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn failing_pings(self, pings: Vec<Outcome<(), Error>>) -> Self {
        *self.pings.lock().unwrap() = pings.into();
        self
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn ping_count(&self) -> usize {
        self.ping_count.load(Ordering::SeqCst)
    }

    fn next_reply(&self, sql: &str) -> Reply {
        self.statements.lock().unwrap().push(sql.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(query_error("no scripted reply")))
    }
}

impl Connection for ScriptedConnection {
    fn query(&self, _cx: &Cx, sql: &str) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let outcome = match self.next_reply(sql) {
            Reply::Rows(rows) => Outcome::Ok(rows),
            Reply::Affected(_) => Outcome::Ok(Vec::new()),
            Reply::Fail(e) => Outcome::Err(e),
        };
        async move { outcome }
    }

    fn execute(&self, _cx: &Cx, sql: &str) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let outcome = match self.next_reply(sql) {
            Reply::Affected(n) => Outcome::Ok(n),
            Reply::Rows(rows) => Outcome::Ok(rows.len() as u64),
            Reply::Fail(e) => Outcome::Err(e),
        };
        async move { outcome }
    }

    fn ping(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        self.ping_count.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .pings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Ok(()));
        async move { outcome }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

fn disconnected() -> Error {
    Error::connection(ConnectionErrorKind::Disconnected, "server has gone away")
}

fn query_error(message: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Database,
        sql: None,
        message: message.into(),
        source: None,
    })
}

fn team_rows() -> Vec<Row> {
    let columns = vec!["id".to_string(), "name".to_string(), "rating".to_string()];
    vec![
        Row::new(
            columns.clone(),
            vec![Value::BigInt(254), Value::from("Cheesy Poofs"), Value::Double(91.5)],
        ),
        Row::new(
            columns,
            vec![Value::BigInt(1678), Value::from("Citrus Circuits"), Value::Null],
        ),
    ]
}

fn no_ping() -> DatabaseOptions {
    DatabaseOptions::new().ping_before_query(false)
}

fn run<T>(f: impl AsyncFnOnce(&Cx) -> T) -> T {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    rt.block_on(async { f(&cx).await })
}

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

fn expect_err<T: std::fmt::Debug>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn query_returns_one_mapping_per_row() {
    let db = Database::with_options(ScriptedConnection::new(vec![Reply::Rows(team_rows())]), no_ping());
    let mappings = run(async |cx| {
        db.query(cx, "SELECT id, name, rating FROM teams WHERE id > ?", &[Value::Int(100)])
            .await
    });
    let mappings = unwrap_outcome(mappings);

    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].get("id"), Some(&Value::BigInt(254)));
    assert_eq!(mappings[0].get("name"), Some(&Value::from("Cheesy Poofs")));
    assert_eq!(mappings[1].get("rating"), Some(&Value::Null));
    assert_eq!(
        db.connection().statements(),
        vec!["SELECT id, name, rating FROM teams WHERE id > 100".to_string()]
    );
}

#[test]
fn query_without_rows_is_empty() {
    let db = Database::with_options(ScriptedConnection::new(vec![Reply::Rows(Vec::new())]), no_ping());
    let mappings = unwrap_outcome(run(async |cx| db.query(cx, "SELECT 1 FROM dual WHERE 0", &[]).await));
    assert!(mappings.is_empty());
}

#[test]
fn query_as_builds_typed_models() {
    let db = Database::with_options(ScriptedConnection::new(vec![Reply::Rows(team_rows())]), no_ping());
    let teams = unwrap_outcome(run(async |cx| {
        db.query_as::<Team>(cx, "SELECT id, name, rating FROM teams", &[]).await
    }));
    assert_eq!(
        teams,
        vec![
            Team {
                id: 254,
                name: "Cheesy Poofs".into(),
                rating: Some(91.5),
            },
            Team {
                id: 1678,
                name: "Citrus Circuits".into(),
                rating: None,
            },
        ]
    );
}

#[test]
fn query_as_stops_at_first_invalid_row() {
    let mut rows = team_rows();
    rows.push(Row::new(
        vec!["id".into(), "name".into(), "rating".into()],
        vec![Value::from("oops"), Value::from("Bad"), Value::Null],
    ));
    let db = Database::with_options(ScriptedConnection::new(vec![Reply::Rows(rows)]), no_ping());
    let err = expect_err(run(async |cx| {
        db.query_as::<Team>(cx, "SELECT id, name, rating FROM teams", &[]).await
    }));
    assert!(matches!(err, Error::TypeMismatch { ref field, .. } if field == "id"));
}

#[test]
fn query_instances_uses_runtime_definition() {
    let definition = ModelDefinition::builder("Team")
        .field("id", FieldType::Integer)
        .field("name", FieldType::Text)
        .nullable_field("rating", FieldType::Float)
        .build()
        .unwrap();
    let db = Database::with_options(ScriptedConnection::new(vec![Reply::Rows(team_rows())]), no_ping());
    let instances = unwrap_outcome(run(async |cx| {
        db.query_instances(cx, &definition, "SELECT * FROM teams", &[]).await
    }));
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].get("name"), Some(&Value::from("Cheesy Poofs")));
    assert_eq!(instances[1].to_string(), "Team(id=1678, name=\"Citrus Circuits\", rating=NULL)");
}

#[test]
fn parameter_mismatch_never_reaches_the_driver() {
    let db = Database::new(ScriptedConnection::new(vec![Reply::Rows(team_rows())]));
    let err = expect_err(run(async |cx| {
        db.query(cx, "SELECT * FROM teams WHERE id = ? AND name = ?", &[Value::Int(1)])
            .await
    }));
    assert!(matches!(
        err,
        Error::Params {
            expected: 2,
            provided: 1
        }
    ));
    assert!(db.connection().statements().is_empty());
    assert_eq!(db.connection().ping_count(), 0);
}

#[test]
fn connection_error_pings_and_retries_once() {
    let db = Database::with_options(
        ScriptedConnection::new(vec![Reply::Fail(disconnected()), Reply::Rows(team_rows())]),
        no_ping(),
    );
    let mappings = unwrap_outcome(run(async |cx| db.query(cx, "SELECT * FROM teams", &[]).await));
    assert_eq!(mappings.len(), 2);
    assert_eq!(db.connection().ping_count(), 1);
    assert_eq!(db.connection().statements().len(), 2);
}

#[test]
fn second_connection_error_is_returned() {
    let db = Database::with_options(
        ScriptedConnection::new(vec![Reply::Fail(disconnected()), Reply::Fail(disconnected())]),
        no_ping(),
    );
    let err = expect_err(run(async |cx| db.query(cx, "SELECT * FROM teams", &[]).await));
    assert!(err.is_connection_error());
    assert_eq!(db.connection().ping_count(), 1);
    assert_eq!(db.connection().statements().len(), 2);
}

#[test]
fn failed_reconnect_returns_ping_error() {
    let ping_failure = Error::connection(ConnectionErrorKind::Ping, "no reply");
    let conn = ScriptedConnection::new(vec![Reply::Fail(disconnected())])
        .failing_pings(vec![Outcome::Err(ping_failure)]);
    let db = Database::with_options(conn, no_ping());
    let err = expect_err(run(async |cx| db.query(cx, "SELECT 1", &[]).await));
    assert!(matches!(err, Error::Connection(ref c) if c.kind == ConnectionErrorKind::Ping));
    assert_eq!(db.connection().statements().len(), 1);
}

#[test]
fn query_errors_are_not_retried() {
    let db = Database::with_options(
        ScriptedConnection::new(vec![Reply::Fail(query_error("syntax")), Reply::Rows(team_rows())]),
        no_ping(),
    );
    let err = expect_err(run(async |cx| db.query(cx, "SELEC 1", &[]).await));
    assert!(matches!(err, Error::Query(_)));
    assert_eq!(db.connection().ping_count(), 0);
    assert_eq!(db.connection().statements().len(), 1);
}

#[test]
fn retry_can_be_disabled() {
    let db = Database::with_options(
        ScriptedConnection::new(vec![Reply::Fail(disconnected()), Reply::Rows(team_rows())]),
        no_ping().retry_on_disconnect(false),
    );
    let err = expect_err(run(async |cx| db.query(cx, "SELECT * FROM teams", &[]).await));
    assert!(err.is_connection_error());
    assert_eq!(db.connection().ping_count(), 0);
    assert_eq!(db.connection().statements().len(), 1);
}

#[test]
fn ping_before_query_is_on_by_default() {
    let db = Database::new(ScriptedConnection::new(vec![
        Reply::Rows(team_rows()),
        Reply::Affected(3),
    ]));
    unwrap_outcome(run(async |cx| db.query(cx, "SELECT * FROM teams", &[]).await));
    let affected = unwrap_outcome(run(async |cx| {
        db.execute(cx, "UPDATE teams SET rating = ? WHERE rating IS NULL", &[Value::Double(0.0)])
            .await
    }));
    assert_eq!(affected, 3);
    assert_eq!(db.connection().ping_count(), 2);
    assert_eq!(
        db.connection().statements()[1],
        "UPDATE teams SET rating = 0 WHERE rating IS NULL"
    );
}

#[test]
fn dead_connection_fails_before_query() {
    let conn = ScriptedConnection::new(vec![Reply::Rows(team_rows())])
        .failing_pings(vec![Outcome::Err(disconnected())]);
    let db = Database::new(conn);
    let err = expect_err(run(async |cx| db.query(cx, "SELECT * FROM teams", &[]).await));
    assert!(err.is_connection_error());
    assert!(db.connection().statements().is_empty());
}

#[test]
fn ensure_connection_and_close() {
    let db = Database::new(ScriptedConnection::new(Vec::new()));
    unwrap_outcome(run(async |cx| db.ensure_connection(cx).await));
    assert_eq!(db.connection().ping_count(), 1);
    run(async |cx| db.close(cx).await).unwrap();
}
