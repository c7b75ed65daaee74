//! The `Database` wrapper: connection upkeep and query passthrough.

use std::future::Future;

use targa_core::{
    Connection, Cx, Error, Model, ModelDefinition, ModelInstance, Outcome, Result, Row,
    RowMapping, Value, build,
};

use crate::config::DatabaseOptions;
use crate::params::substitute;

/// A connection plus the conveniences Targa adds on top of it.
///
/// Queries take `?` placeholders, which are filled with escaped literals
/// before the statement reaches the driver. Results come back as row
/// mappings, or as typed models with [`Database::query_as`].
///
/// # Example
///
/// ```ignore
/// let db = Database::connect(&cx, MySqlConfig::from_env()?).await?;
/// let teams: Vec<Team> = db
///     .query_as(&cx, "SELECT id, name, rating FROM teams WHERE id > ?", &[Value::Int(100)])
///     .await?;
/// ```
#[derive(Debug)]
pub struct Database<C: Connection> {
    conn: C,
    options: DatabaseOptions,
}

impl<C: Connection> Database<C> {
    /// Wrap an open connection with default options.
    pub fn new(conn: C) -> Self {
        Self::with_options(conn, DatabaseOptions::default())
    }

    pub fn with_options(conn: C, options: DatabaseOptions) -> Self {
        Self { conn, options }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn options(&self) -> DatabaseOptions {
        self.options
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Ping the connection; a dead connection surfaces as an error.
    #[tracing::instrument(level = "trace", skip(self, cx))]
    pub async fn ensure_connection(&self, cx: &Cx) -> Outcome<(), Error> {
        self.conn.ping(cx).await
    }

    /// Run a statement and return its rows as mappings of column name to value.
    ///
    /// Statements that produce no result set return an empty list.
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(params = params.len()))]
    pub async fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<RowMapping>, Error> {
        self.query_rows(cx, sql, params).await.and_then(|rows| {
            tracing::debug!(row_count = rows.len(), "Query returned rows");
            Outcome::Ok(rows.into_iter().map(Row::into_mapping).collect())
        })
    }

    /// Run a statement and return the driver's rows unchanged.
    pub async fn query_rows(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<Row>, Error> {
        let sql = match substitute(sql, params) {
            Ok(sql) => sql,
            Err(e) => return Outcome::Err(e),
        };
        let sql = sql.as_str();
        self.run(cx, move || self.conn.query(cx, sql)).await
    }

    /// Run a statement and return the number of affected rows.
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(params = params.len()))]
    pub async fn execute(&self, cx: &Cx, sql: &str, params: &[Value]) -> Outcome<u64, Error> {
        let sql = match substitute(sql, params) {
            Ok(sql) => sql,
            Err(e) => return Outcome::Err(e),
        };
        let sql = sql.as_str();
        self.run(cx, move || self.conn.execute(cx, sql)).await
    }

    /// Run a query and build one `M` per row.
    ///
    /// The first row that fails validation aborts the whole call.
    #[tracing::instrument(level = "debug", skip(self, cx, params), fields(model = M::MODEL_NAME))]
    pub async fn query_as<M: Model>(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<M>, Error> {
        self.query_rows(cx, sql, params)
            .await
            .and_then(|rows| match collect_models::<M>(&rows) {
                Ok(models) => Outcome::Ok(models),
                Err(e) => Outcome::Err(e),
            })
    }

    /// Run a query and validate every row against `definition`.
    pub async fn query_instances<'d>(
        &self,
        cx: &Cx,
        definition: &'d ModelDefinition,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<ModelInstance<'d>>, Error> {
        self.query(cx, sql, params).await.and_then(|mappings| {
            let instances: Result<Vec<_>> = mappings
                .iter()
                .map(|mapping| build(definition, mapping))
                .collect();
            match instances {
                Ok(instances) => Outcome::Ok(instances),
                Err(e) => {
                    tracing::debug!(model = %definition.name(), error = %e, "Row failed validation");
                    Outcome::Err(e)
                }
            }
        })
    }

    /// Close the underlying connection.
    pub async fn close(self, cx: &Cx) -> Result<()> {
        self.conn.close(cx).await
    }

    /// Run `op` with the configured ping-before and retry-once behavior.
    async fn run<T, F, Fut>(&self, cx: &Cx, op: F) -> Outcome<T, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Outcome<T, Error>>,
    {
        if self.options.ping_before_query {
            match self.ensure_connection(cx).await {
                Outcome::Ok(()) => {}
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        match op().await {
            Outcome::Err(e) if self.options.retry_on_disconnect && e.is_connection_error() => {
                tracing::warn!(error = %e, "Connection lost during query; reconnecting and retrying once");
                match self.conn.ping(cx).await {
                    Outcome::Ok(()) => op().await,
                    Outcome::Err(ping_err) => {
                        tracing::warn!(error = %ping_err, "Reconnect failed");
                        Outcome::Err(ping_err)
                    }
                    Outcome::Cancelled(r) => Outcome::Cancelled(r),
                    Outcome::Panicked(p) => Outcome::Panicked(p),
                }
            }
            other => other,
        }
    }
}

#[allow(clippy::result_large_err)]
fn collect_models<M: Model>(rows: &[Row]) -> Result<Vec<M>> {
    rows.iter()
        .map(|row| {
            M::from_row(row).inspect_err(|e| {
                tracing::debug!(model = M::MODEL_NAME, error = %e, "Row failed validation");
            })
        })
        .collect()
}
