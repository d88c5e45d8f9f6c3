use serde_json::Value;
use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Postgres, Row};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Typed SELECT over one table driven by a [`FilterData`] document.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(table_name)?,
            _phantom: std::marker::PhantomData,
        })
    }

    /// Text-bound parameters compared against `column` are cast to `pg_type`.
    pub fn cast(mut self, column: &str, pg_type: &str) -> Self {
        self.filter.cast(column, pg_type);
        self
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = q.bind_value(p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(&self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = q.bind_value(p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    /// Matching rows ignoring any limit or offset.
    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let SqlResult { query, params } = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&query);
        for p in params.iter() {
            q = q.bind_value(p);
        }
        let row = q.fetch_one(pool).await?;
        Ok(row.try_get("count")?)
    }
}

/// Bind a JSON filter parameter as the closest Postgres scalar.
///
/// Arrays never reach here: `$in` and `$between` expand into one placeholder per element.
trait BindValue<'q>: Sized {
    fn bind_value(self, value: &'q Value) -> Self;
}

impl<'q> BindValue<'q> for sqlx::query::Query<'q, Postgres, PgArguments> {
    fn bind_value(self, value: &'q Value) -> Self {
        match value {
            Value::Null => self.bind(None::<String>),
            Value::Bool(b) => self.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => self.bind(i),
                None => self.bind(n.as_f64()),
            },
            Value::String(s) => self.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => self.bind(value.clone()),
        }
    }
}

impl<'q, O> BindValue<'q> for sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    fn bind_value(self, value: &'q Value) -> Self {
        match value {
            Value::Null => self.bind(None::<String>),
            Value::Bool(b) => self.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => self.bind(i),
                None => self.bind(n.as_f64()),
            },
            Value::String(s) => self.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => self.bind(value.clone()),
        }
    }
}
