//! The seam between Targa and the underlying database driver.
//!
//! Operations take an asupersync `Cx` and return an `Outcome`, so cancellation
//! and panics surface the same way they do in the driver.

use crate::error::Result;
use crate::row::Row;
use asupersync::{Cx, Outcome};

/// A live connection to the database.
///
/// SQL handed to a connection is complete: placeholders have already been
/// replaced by escaped literals.
///
/// # Example
///
/// ```rust,ignore
/// let rows = conn.query(&cx, "SELECT id, name FROM teams").await?;
/// conn.execute(&cx, "SET autocommit = 1").await?;
/// ```
pub trait Connection: Send + Sync {
    /// Execute a statement and return its result rows (empty when it produces none).
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
    ) -> impl Future<Output = Outcome<Vec<Row>, crate::Error>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, cx: &Cx, sql: &str) -> impl Future<Output = Outcome<u64, crate::Error>> + Send;

    /// Check that the connection is still alive.
    ///
    /// Drivers that can reconnect transparently do so here.
    fn ping(&self, cx: &Cx) -> impl Future<Output = Outcome<(), crate::Error>> + Send;

    /// Check if the connection is still valid (alias for ping that returns bool).
    fn is_valid(&self, cx: &Cx) -> impl Future<Output = bool> + Send {
        async {
            match self.ping(cx).await {
                Outcome::Ok(()) => true,
                Outcome::Err(_) | Outcome::Cancelled(_) | Outcome::Panicked(_) => false,
            }
        }
    }

    /// Close the connection gracefully.
    fn close(self, cx: &Cx) -> impl Future<Output = Result<()>> + Send;
}
