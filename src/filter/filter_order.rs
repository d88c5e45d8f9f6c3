use serde_json::Value;

use super::error::FilterError;
use super::types::{is_identifier, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"upload_date desc, id desc"`, `["upload_date desc", "id desc"]` or
    /// `{ "upload_date": "desc" }`. Object keys are unordered, so multi-column sorts should use
    /// the string or array form.
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::Null => Ok(vec![]),
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => {
                            return Err(FilterError::InvalidOperatorData(format!("order entry must be a string: {}", other)))
                        }
                    }
                }
                Ok(out)
            }
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (column, v) in obj {
                    Self::validate_column(column)?;
                    let sort = Self::parse_direction(v.as_str().unwrap_or("asc"));
                    out.push(FilterOrderInfo { column: column.clone(), sort });
                }
                Ok(out)
            }
            _ => Err(FilterError::InvalidOperatorData("order must be a string, array or object".to_string())),
        }
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let mut it = part.split_whitespace();
            if let Some(column) = it.next() {
                Self::validate_column(column)?;
                let sort = Self::parse_direction(it.next().unwrap_or("asc"));
                out.push(FilterOrderInfo { column: column.to_string(), sort });
            }
        }
        Ok(out)
    }

    fn parse_direction(dir: &str) -> SortDirection {
        if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if is_identifier(column) {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(column.to_string()))
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
