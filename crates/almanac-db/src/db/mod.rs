use futures::future::BoxFuture;

use crate::error::DbResult;

pub mod connection;
pub mod query;
pub mod schema;

pub trait DbProvider: Send + Sync {
    fn get_connection<'a>(&'a self) -> BoxFuture<'a, DbResult<connection::DbConnection<'a>>>;
}
