use serde_json::json;

use crate::error::CoreError;
use crate::time::Ticket;

/// Wire tag of a primitive payload. Container elements use the tags above
/// `Date` in the snapshot encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Null = 0,
    Boolean = 1,
    Integer = 2,
    Long = 3,
    Double = 4,
    String = 5,
    Bytes = 6,
    Date = 7,
}

impl ValueType {
    pub fn from_u8(tag: u8) -> Option<ValueType> {
        match tag {
            0 => Some(ValueType::Null),
            1 => Some(ValueType::Boolean),
            2 => Some(ValueType::Integer),
            3 => Some(ValueType::Long),
            4 => Some(ValueType::Double),
            5 => Some(ValueType::String),
            6 => Some(ValueType::Bytes),
            7 => Some(ValueType::Date),
            _ => None,
        }
    }
}

/// A primitive JSON value. `Date` is a UNIX timestamp in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(i64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Date(_) => ValueType::Date,
        }
    }

    /// Little-endian byte payload as carried on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Boolean(v) => vec![u8::from(*v)],
            Value::Integer(v) => v.to_le_bytes().to_vec(),
            Value::Long(v) => v.to_le_bytes().to_vec(),
            Value::Double(v) => v.to_le_bytes().to_vec(),
            Value::String(v) => v.as_bytes().to_vec(),
            Value::Bytes(v) => v.clone(),
            Value::Date(v) => v.to_le_bytes().to_vec(),
        }
    }

    pub fn from_bytes(value_type: ValueType, data: &[u8]) -> Result<Value, CoreError> {
        let invalid = || CoreError::InvalidPrimitive { value_type };
        match value_type {
            ValueType::Null => Ok(Value::Null),
            ValueType::Boolean => match data {
                [0] => Ok(Value::Boolean(false)),
                [1] => Ok(Value::Boolean(true)),
                _ => Err(invalid()),
            },
            ValueType::Integer => Ok(Value::Integer(i32::from_le_bytes(
                data.try_into().map_err(|_| invalid())?,
            ))),
            ValueType::Long => Ok(Value::Long(i64::from_le_bytes(
                data.try_into().map_err(|_| invalid())?,
            ))),
            ValueType::Double => Ok(Value::Double(f64::from_le_bytes(
                data.try_into().map_err(|_| invalid())?,
            ))),
            ValueType::String => Ok(Value::String(
                std::str::from_utf8(data).map_err(|_| invalid())?.to_string(),
            )),
            ValueType::Bytes => Ok(Value::Bytes(data.to_vec())),
            ValueType::Date => Ok(Value::Date(i64::from_le_bytes(
                data.try_into().map_err(|_| invalid())?,
            ))),
        }
    }

    /// JSON rendering of the value. Bytes become an array of numbers, dates
    /// the UNIX seconds.
    pub fn marshal(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Double(v) => json!(v).to_string(),
            Value::String(v) => json!(v).to_string(),
            Value::Bytes(v) => json!(v).to_string(),
            Value::Date(v) => v.to_string(),
        }
    }
}

/// A primitive element: a typed value plus the logical clock identifying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    value: Value,
    created_at: Ticket,
    deleted_at: Option<Ticket>,
}

impl Primitive {
    pub fn new(value: Value, created_at: Ticket) -> Self {
        Primitive {
            value,
            created_at,
            deleted_at: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    pub fn deleted_at(&self) -> Option<Ticket> {
        self.deleted_at
    }

    /// Marks the primitive deleted. Monotone: an earlier ticket than the
    /// current tombstone is a no-op. Returns whether the tombstone changed.
    pub fn delete(&mut self, deleted_at: Ticket) -> bool {
        match self.deleted_at {
            Some(current) if deleted_at <= current => false,
            _ => {
                self.deleted_at = Some(deleted_at);
                true
            }
        }
    }

    pub fn marshal(&self) -> String {
        self.value.marshal()
    }
}
