//! SQL query modules for the PostgreSQL storage backend.

pub mod builder;
pub mod crud;

pub use builder::{BuiltQuery, QueryBuilder, SqlParam, select_count, select_page};

use sqlx_core::query_scalar::QueryScalar;
use sqlx_postgres::{PgArguments, Postgres};

/// Binds every parameter of a built query, in placeholder order.
pub(crate) trait BindAllParams<'q> {
    fn bind_all_params(self, params: &'q [SqlParam]) -> Self;
}

impl<'q, O> BindAllParams<'q> for QueryScalar<'q, Postgres, O, PgArguments> {
    fn bind_all_params(mut self, params: &'q [SqlParam]) -> Self {
        for param in params {
            self = match param {
                SqlParam::Text(s) => self.bind(s.as_str()),
                SqlParam::Integer(i) => self.bind(*i),
            };
        }
        self
    }
}
