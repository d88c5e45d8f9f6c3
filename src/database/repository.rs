use serde_json::json;
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Filter-driven reads over one table.
pub struct Repository<T> {
    table_name: String,
    casts: Vec<(&'static str, &'static str)>,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table_name: table_name.into(),
            casts: Vec::new(),
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn with_cast(mut self, column: &'static str, pg_type: &'static str) -> Self {
        self.casts.push((column, pg_type));
        self
    }

    fn builder(&self, filter_data: FilterData) -> Result<QueryBuilder<T>, DatabaseError> {
        let mut builder = QueryBuilder::<T>::new(&self.table_name)?;
        for (column, pg_type) in &self.casts {
            builder = builder.cast(column, pg_type);
        }
        builder.filter(filter_data)
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        self.builder(filter_data)?.select_all(&self.pool).await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        self.builder(FilterData { limit: Some(1), ..filter_data })?
            .select_optional(&self.pool)
            .await
    }

    pub async fn select_id(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.builder(filter_data)?.count(&self.pool).await
    }

    /// One window of rows plus the count of every row the filter matches.
    pub async fn select_page(&self, filter_data: FilterData) -> Result<(Vec<T>, i64), DatabaseError> {
        let builder = self.builder(filter_data)?;
        let rows = builder.select_all(&self.pool).await?;
        let total = builder.count(&self.pool).await?;
        Ok((rows, total))
    }
}
