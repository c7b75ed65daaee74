//! MySQL driver adapter over asupersync's MySQL client.
//!
//! The client needs `&mut` access for every call, so it is wrapped in an
//! `Arc<Mutex<_>>` and locked per operation.

use std::sync::Arc;

use asupersync::database::{
    MySqlConnectOptions, MySqlConnection, MySqlError, MySqlRow, MySqlSslMode, MySqlValue,
};
use asupersync::sync::Mutex;
use asupersync::{Cx, Outcome};

use targa_core::{
    ColumnInfo, Connection, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, Row, Value,
};

use crate::config::{DatabaseOptions, MySqlConfig, SslMode};
use crate::database::Database;

/// A MySQL connection usable as a Targa [`Connection`].
///
/// Remembers its configuration so a failed ping can reconnect.
pub struct MySqlClient {
    inner: Arc<Mutex<Option<MySqlConnection>>>,
    config: MySqlConfig,
}

impl MySqlClient {
    /// Open a connection and apply the configured autocommit mode.
    pub async fn connect(cx: &Cx, config: MySqlConfig) -> Outcome<Self, Error> {
        let conn = match open(cx, &config).await {
            Outcome::Ok(conn) => conn,
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        };
        Outcome::Ok(Self {
            inner: Arc::new(Mutex::new(Some(conn))),
            config,
        })
    }

    pub fn config(&self) -> &MySqlConfig {
        &self.config
    }
}

impl std::fmt::Debug for MySqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlClient")
            .field("addr", &self.config.socket_addr())
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl Database<MySqlClient> {
    /// Connect to MySQL and wrap the connection with default options.
    #[tracing::instrument(level = "debug", skip(cx, config), fields(addr = %config.socket_addr()))]
    pub async fn connect(cx: &Cx, config: MySqlConfig) -> Outcome<Self, Error> {
        Self::connect_with_options(cx, config, DatabaseOptions::default()).await
    }

    pub async fn connect_with_options(
        cx: &Cx,
        config: MySqlConfig,
        options: DatabaseOptions,
    ) -> Outcome<Self, Error> {
        MySqlClient::connect(cx, config)
            .await
            .and_then(|client| Outcome::Ok(Database::with_options(client, options)))
    }
}

async fn open(cx: &Cx, config: &MySqlConfig) -> Outcome<MySqlConnection, Error> {
    let options = MySqlConnectOptions {
        host: config.host.clone(),
        port: config.port,
        database: config.database.clone(),
        user: config.user.clone(),
        password: config.password.clone(),
        connect_timeout: Some(config.connect_timeout),
        ssl_mode: match config.ssl_mode {
            SslMode::Disable => MySqlSslMode::Disabled,
            SslMode::Preferred => MySqlSslMode::Preferred,
            SslMode::Required => MySqlSslMode::Required,
        },
    };

    let mut conn = match MySqlConnection::connect_with_options(cx, options).await {
        Outcome::Ok(conn) => conn,
        Outcome::Err(e) => {
            return Outcome::Err(connection_error(ConnectionErrorKind::Connect, e));
        }
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    };

    let autocommit = if config.autocommit {
        "SET autocommit = 1"
    } else {
        "SET autocommit = 0"
    };
    match conn.execute(cx, autocommit).await {
        Outcome::Ok(_) => {}
        Outcome::Err(e) => return Outcome::Err(convert_error(e, Some(autocommit))),
        Outcome::Cancelled(r) => return Outcome::Cancelled(r),
        Outcome::Panicked(p) => return Outcome::Panicked(p),
    }

    tracing::debug!(
        addr = %config.socket_addr(),
        autocommit = config.autocommit,
        "Connected to MySQL"
    );
    Outcome::Ok(conn)
}

fn lock_error() -> Error {
    Error::connection(
        ConnectionErrorKind::Disconnected,
        "Failed to acquire connection lock",
    )
}

fn closed_error() -> Error {
    Error::connection(ConnectionErrorKind::Disconnected, "Connection is closed")
}

fn connection_error(kind: ConnectionErrorKind, e: MySqlError) -> Error {
    let kind = match e {
        MySqlError::AuthenticationFailed(_) => ConnectionErrorKind::Authentication,
        _ => kind,
    };
    Error::Connection(ConnectionError {
        kind,
        message: e.to_string(),
        source: Some(Box::new(e)),
    })
}

/// Map a driver error onto the Targa taxonomy.
///
/// I/O failures and closed connections are connection errors so the
/// `Database` retry path sees them; server errors are query errors.
fn convert_error(e: MySqlError, sql: Option<&str>) -> Error {
    match e {
        MySqlError::Io(_) | MySqlError::ConnectionClosed | MySqlError::Protocol(_) => {
            connection_error(ConnectionErrorKind::Disconnected, e)
        }
        MySqlError::AuthenticationFailed(_) => {
            connection_error(ConnectionErrorKind::Authentication, e)
        }
        MySqlError::Server { code, .. } => {
            let kind = match code {
                1064 => QueryErrorKind::Syntax,
                1054 | 1146 => QueryErrorKind::NotFound,
                1062 | 1451 | 1452 => QueryErrorKind::Constraint,
                _ => QueryErrorKind::Database,
            };
            Error::Query(QueryError {
                kind,
                sql: sql.map(str::to_string),
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
        }
        _ => Error::Query(QueryError {
            kind: QueryErrorKind::Database,
            sql: sql.map(str::to_string),
            message: e.to_string(),
            source: Some(Box::new(e)),
        }),
    }
}

fn convert_value(value: &MySqlValue) -> Value {
    match value {
        MySqlValue::Null => Value::Null,
        MySqlValue::Bool(b) => Value::Bool(*b),
        MySqlValue::Tiny(v) => Value::TinyInt(*v),
        MySqlValue::Short(v) => Value::SmallInt(*v),
        MySqlValue::Long(v) => Value::Int(*v),
        MySqlValue::LongLong(v) => Value::BigInt(*v),
        MySqlValue::Float(v) => Value::Float(*v),
        MySqlValue::Double(v) => Value::Double(*v),
        MySqlValue::Text(s) => Value::Text(s.clone()),
        MySqlValue::Bytes(b) => Value::Bytes(b.clone()),
    }
}

fn convert_rows(rows: &[MySqlRow]) -> Vec<Row> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let columns = Arc::new(ColumnInfo::new(
        first.columns().iter().map(|c| c.name.clone()).collect(),
    ));
    rows.iter()
        .map(|row| {
            let values = (0..row.len())
                .map(|i| row.get_idx(i).map_or(Value::Null, convert_value))
                .collect();
            Row::with_columns(Arc::clone(&columns), values)
        })
        .collect()
}

impl Connection for MySqlClient {
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let sql = sql.to_string();
        async move {
            let Ok(mut guard) = inner.lock(cx).await else {
                return Outcome::Err(lock_error());
            };
            let Some(conn) = guard.as_mut() else {
                return Outcome::Err(closed_error());
            };
            tracing::trace!(sql = %sql, "Executing query");
            match conn.query(cx, &sql).await {
                Outcome::Ok(rows) => Outcome::Ok(convert_rows(&rows)),
                Outcome::Err(e) => Outcome::Err(convert_error(e, Some(&sql))),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    fn execute(&self, cx: &Cx, sql: &str) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let sql = sql.to_string();
        async move {
            let Ok(mut guard) = inner.lock(cx).await else {
                return Outcome::Err(lock_error());
            };
            let Some(conn) = guard.as_mut() else {
                return Outcome::Err(closed_error());
            };
            tracing::trace!(sql = %sql, "Executing statement");
            match conn.execute(cx, &sql).await {
                Outcome::Ok(n) => Outcome::Ok(n),
                Outcome::Err(e) => Outcome::Err(convert_error(e, Some(&sql))),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    /// Ping the server, reconnecting once if the ping fails.
    fn ping(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        let inner = Arc::clone(&self.inner);
        let config = self.config.clone();
        async move {
            let Ok(mut guard) = inner.lock(cx).await else {
                return Outcome::Err(lock_error());
            };
            if let Some(conn) = guard.as_mut() {
                match conn.ping(cx).await {
                    Outcome::Ok(()) => return Outcome::Ok(()),
                    Outcome::Err(e) => {
                        tracing::warn!(error = %e, "Ping failed; reconnecting");
                    }
                    Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                    Outcome::Panicked(p) => return Outcome::Panicked(p),
                }
            }
            match open(cx, &config).await {
                Outcome::Ok(conn) => {
                    *guard = Some(conn);
                    Outcome::Ok(())
                }
                Outcome::Err(e) => {
                    *guard = None;
                    Outcome::Err(e)
                }
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    fn close(self, cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        async move {
            let Ok(mut guard) = self.inner.lock(cx).await else {
                return Err(lock_error());
            };
            match guard.take() {
                Some(mut conn) => conn
                    .close()
                    .await
                    .map_err(|e| connection_error(ConnectionErrorKind::Disconnected, e)),
                None => Ok(()),
            }
        }
    }
}
