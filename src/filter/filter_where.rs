use serde_json::Value;

use super::error::FilterError;
use super::types::{is_identifier, FilterOp, FilterWhereInfo, FilterWhereOptions};

/// Renders a WHERE document into a SQL predicate plus positional parameters.
///
/// Top-level keys are joined with AND. `$and`, `$or` and `$not` nest; placeholders are numbered
/// continuously across nesting so the parameter list lines up with the SQL.
pub struct FilterWhere<'a> {
    options: &'a FilterWhereOptions,
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &'a FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self {
            options,
            param_values: vec![],
            param_index: starting_param_index,
        };
        let sql = filter_where.render(where_data)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn render(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let conditions = self.parse_where_data(where_data)?;
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in &conditions {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        if sql_conditions.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(sql_conditions.join(" AND "))
        }
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        match where_data {
            Value::Null => Ok(vec![]),
            Value::Object(obj) => {
                let mut conditions = vec![];
                for (key, value) in obj {
                    if key.starts_with('$') {
                        conditions.push(self.parse_logical_operator(key, value)?);
                    } else {
                        conditions.extend(Self::parse_field_condition(key, value)?);
                    }
                }
                Ok(conditions)
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<FilterWhereInfo, FilterError> {
        let sql = match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Empty conjunction is true, empty disjunction is false
                    if op == "$and" { "1=1".to_string() } else { "1=0".to_string() }
                } else {
                    let mut parts = Vec::with_capacity(arr.len());
                    for v in arr {
                        parts.push(format!("({})", self.render(v)?));
                    }
                    let joiner = if op == "$and" { " AND " } else { " OR " };
                    format!("({})", parts.join(joiner))
                }
            }
            "$not" => format!("NOT ({})", self.render(value)?),
            _ => return Err(FilterError::UnsupportedOperator(op.to_string())),
        };
        Ok(FilterWhereInfo { column: sql, operator: FilterOp::Sql, data: Value::Null })
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator: Self::map_operator(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }]),
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = condition.column.as_str();
        let quoted_column = format!("\"{}\"", column);
        let data = &condition.data;
        let sql = match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(column, data)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.param(column, data)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(column, data)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(column, data)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(column, data)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(column, data)),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.param(column, data)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(column, data)),
            FilterOp::In => match data {
                Value::Array(values) if values.is_empty() => "1=0".to_string(),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(column, v)).collect();
                    format!("{} IN ({})", quoted_column, params.join(", "))
                }
                _ => format!("{} = {}", quoted_column, self.param(column, data)),
            },
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    quoted_column,
                    self.param(column, &values[0]),
                    self.param(column, &values[1])
                ),
                _ => {
                    return Err(FilterError::InvalidOperatorData(
                        "$between requires array with 2 values".to_string(),
                    ))
                }
            },
            FilterOp::Sql => condition.column.clone(),
        };
        Ok(sql)
    }

    fn param(&mut self, column: &str, value: &Value) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        match self.options.casts.get(column) {
            Some(pg_type) => format!("${}::{}", self.param_index, pg_type),
            None => format!("${}", self.param_index),
        }
    }
}
