use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::time::Ticket;

use super::array::Array;
use super::object::Object;
use super::primitive::{Primitive, Value, ValueType};
use super::root::Root;
use super::text::Text;

pub(crate) const TAG_OBJECT: u8 = 8;
pub(crate) const TAG_ARRAY: u8 = 9;
pub(crate) const TAG_TEXT: u8 = 10;

/// A node of the document tree. Closed variant; operations narrow on the
/// tag and drop on mismatch.
#[derive(Debug, Clone)]
pub enum Element {
    Object(Object),
    Array(Array),
    Text(Text),
    Primitive(Primitive),
}

impl Element {
    pub fn created_at(&self) -> Ticket {
        match self {
            Element::Object(v) => v.created_at(),
            Element::Array(v) => v.created_at(),
            Element::Text(v) => v.created_at(),
            Element::Primitive(v) => v.created_at(),
        }
    }

    pub fn deleted_at(&self) -> Option<Ticket> {
        match self {
            Element::Object(v) => v.deleted_at(),
            Element::Array(v) => v.deleted_at(),
            Element::Text(v) => v.deleted_at(),
            Element::Primitive(v) => v.deleted_at(),
        }
    }

    /// Monotone tombstone; returns whether it changed.
    pub fn delete(&mut self, deleted_at: Ticket) -> bool {
        match self {
            Element::Object(v) => v.delete(deleted_at),
            Element::Array(v) => v.delete(deleted_at),
            Element::Text(v) => v.delete(deleted_at),
            Element::Primitive(v) => v.delete(deleted_at),
        }
    }

    pub fn marshal(&self, root: &Root) -> String {
        match self {
            Element::Object(v) => v.marshal(root),
            Element::Array(v) => v.marshal(root),
            Element::Text(v) => v.marshal(),
            Element::Primitive(v) => v.marshal(),
        }
    }

    /// Wire tag: the primitive's value type, or a container tag above them.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Element::Object(_) => TAG_OBJECT,
            Element::Array(_) => TAG_ARRAY,
            Element::Text(_) => TAG_TEXT,
            Element::Primitive(p) => p.value_type() as u8,
        }
    }
}

/// Wire form of an element as carried inside operations: the tag, the
/// creation ticket, and the payload bytes of a primitive. Containers travel
/// empty; their members arrive as separate operations.
#[derive(Serialize, Deserialize)]
struct ElementSimple {
    tag: u8,
    created_at: Ticket,
    value: Vec<u8>,
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = match self {
            Element::Primitive(p) => p.value().to_bytes(),
            _ => Vec::new(),
        };
        ElementSimple {
            tag: self.tag(),
            created_at: self.created_at(),
            value,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let simple = ElementSimple::deserialize(deserializer)?;
        match simple.tag {
            TAG_OBJECT => Ok(Element::Object(Object::new(simple.created_at))),
            TAG_ARRAY => Ok(Element::Array(Array::new(simple.created_at))),
            TAG_TEXT => Ok(Element::Text(Text::new(simple.created_at))),
            tag => {
                let value_type = ValueType::from_u8(tag)
                    .ok_or_else(|| D::Error::custom(format!("unknown element tag {tag}")))?;
                let value = Value::from_bytes(value_type, &simple.value)
                    .map_err(D::Error::custom)?;
                Ok(Element::Primitive(Primitive::new(value, simple.created_at)))
            }
        }
    }
}
