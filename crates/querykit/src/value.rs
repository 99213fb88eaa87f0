//! Bound parameter values.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, Utc};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A parameter value carried by a [`Statement`](crate::Statement).
///
/// Values are never spliced into SQL text by the builder; the execution layer binds them
/// positionally. [`Statement::interpolate`](crate::Statement::interpolate) renders them as
/// literals for debugging only.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    /// Sequence value, expanded to one parameter per element by `IN`/`BETWEEN`.
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Plain text form, used for LIKE patterns and identifier-quoted values.
    pub(crate) fn to_plain_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Json(j) => j.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Timestamp(t) => t.to_rfc3339(),
            Value::Date(d) => d.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_plain_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    serde_json::Value => Json,
    uuid::Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
);

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql_checked(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql_checked(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            Value::Text(s) => s.to_sql_checked(ty, out),
            Value::Bytes(b) => b.to_sql_checked(ty, out),
            Value::Json(j) => j.to_sql_checked(ty, out),
            Value::Uuid(u) => u.to_sql_checked(ty, out),
            Value::Timestamp(t) => t.to_sql_checked(ty, out),
            Value::Date(d) => d.to_sql_checked(ty, out),
            Value::List(items) => items.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn vectors_become_lists() {
        let v = Value::from(vec![1, 2, 3]);
        assert_eq!(
            v.as_list().unwrap(),
            &[Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn int_binds_to_narrower_columns() {
        let mut buf = BytesMut::new();
        Value::Int(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Int(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_null() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }
}
