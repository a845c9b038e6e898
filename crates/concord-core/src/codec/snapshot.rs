//! Byte-exact snapshot encoding of a document tree.
//!
//! A recursive descent over the tree reachable from the root: every element
//! is a tag byte, its creation ticket, an optional tombstone ticket and a
//! payload. Primitive payloads are the little-endian value bytes;
//! containers carry a count followed by their members (object entries
//! sorted by key so the encoding is deterministic). Containers keep their
//! tombstoned members: a change sequenced after the snapshot may still
//! anchor an insert on a node that was already deleted, and a replica
//! loaded from the snapshot must resolve that anchor exactly like one that
//! replayed every change. Only elements no longer reachable from the root
//! (values displaced by a later writer) are compacted away.

use crate::error::CoreError;
use crate::json::{
    Array, Element, Object, Primitive, Root, Text, TextNodeId, Value, ValueType, TAG_ARRAY,
    TAG_OBJECT, TAG_TEXT,
};
use crate::time::{ActorId, Ticket, ACTOR_ID_SIZE};

/// Serialises the document tree rooted at the initial ticket.
pub fn object_to_bytes(root: &Root) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    write_element(&mut out, root, Ticket::INITIAL)?;
    Ok(out)
}

/// Decodes a snapshot back into a document tree, re-registering every
/// element under its creation ticket.
pub fn object_from_bytes(data: &[u8]) -> Result<Root, CoreError> {
    let mut reader = Reader::new(data);
    let mut root = Root::empty();
    let created_at = read_element(&mut reader, &mut root).ok_or(CoreError::CorruptSnapshot)?;
    if !reader.is_eof() {
        return Err(CoreError::CorruptSnapshot);
    }
    if created_at != Ticket::INITIAL
        || !matches!(root.element(created_at), Some(Element::Object(_)))
    {
        return Err(CoreError::InvalidSnapshotRoot);
    }
    Ok(root)
}

fn write_element(out: &mut Vec<u8>, root: &Root, created_at: Ticket) -> Result<(), CoreError> {
    let elem = root
        .element(created_at)
        .ok_or(CoreError::MissingElement(created_at))?;
    out.push(elem.tag());
    write_ticket(out, elem.created_at());
    write_opt_ticket(out, elem.deleted_at());
    match elem {
        Element::Object(obj) => write_object(out, root, obj)?,
        Element::Array(arr) => write_array(out, root, arr)?,
        Element::Text(text) => write_text(out, text),
        Element::Primitive(prim) => write_bytes(out, &prim.value().to_bytes()),
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, root: &Root, obj: &Object) -> Result<(), CoreError> {
    let mut entries: Vec<(&str, Ticket)> = obj.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    write_u32(out, entries.len() as u32);
    for (key, ticket) in entries {
        write_str(out, key);
        write_element(out, root, ticket)?;
    }
    Ok(())
}

fn write_array(out: &mut Vec<u8>, root: &Root, arr: &Array) -> Result<(), CoreError> {
    let nodes = arr.nodes();
    write_u32(out, nodes.len() as u32);
    for (ticket, _) in nodes {
        write_element(out, root, ticket)?;
    }
    Ok(())
}

fn write_text(out: &mut Vec<u8>, text: &Text) {
    let nodes = text.nodes();
    write_u32(out, nodes.len() as u32);
    for node in nodes {
        write_ticket(out, node.id().created_at());
        write_u32(out, node.id().offset());
        write_opt_ticket(out, node.removed_at());
        write_str(out, node.content());
    }
}

fn read_element(r: &mut Reader<'_>, root: &mut Root) -> Option<Ticket> {
    let tag = r.u8()?;
    let created_at = r.ticket()?;
    let deleted_at = r.opt_ticket()?;
    let mut elem = match tag {
        TAG_OBJECT => {
            let count = r.u32()?;
            let mut obj = Object::new(created_at);
            for _ in 0..count {
                let key = r.str()?;
                let child = read_element(r, root)?;
                obj.set(&key, child);
            }
            Element::Object(obj)
        }
        TAG_ARRAY => {
            let count = r.u32()?;
            let mut arr = Array::new(created_at);
            for _ in 0..count {
                let child = read_element(r, root)?;
                let child_deleted_at = root.element(child)?.deleted_at();
                arr.add(child);
                if let Some(t) = child_deleted_at {
                    arr.remove_by_created_at(child, t);
                }
            }
            Element::Array(arr)
        }
        TAG_TEXT => {
            let count = r.u32()?;
            let mut text = Text::new(created_at);
            for _ in 0..count {
                let node_created_at = r.ticket()?;
                let offset = r.u32()?;
                let removed_at = r.opt_ticket()?;
                let content = r.str()?;
                text.append(TextNodeId::new(node_created_at, offset), content, removed_at);
            }
            Element::Text(text)
        }
        tag => {
            let value_type = ValueType::from_u8(tag)?;
            let payload = r.bytes()?;
            let value = Value::from_bytes(value_type, &payload).ok()?;
            Element::Primitive(Primitive::new(value, created_at))
        }
    };
    if let Some(t) = deleted_at {
        elem.delete(t);
    }
    root.register(elem);
    Some(created_at)
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn write_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_u32(out, data.len() as u32);
    out.extend_from_slice(data);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_bytes(out, s.as_bytes());
}

fn write_ticket(out: &mut Vec<u8>, ticket: Ticket) {
    write_u64(out, ticket.lamport());
    write_u32(out, ticket.delimiter());
    out.extend_from_slice(ticket.actor().as_bytes());
}

fn write_opt_ticket(out: &mut Vec<u8>, ticket: Option<Ticket>) {
    match ticket {
        Some(t) => {
            out.push(1);
            write_ticket(out, t);
        }
        None => out.push(0),
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos == self.data.len()
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn u32(&mut self) -> Option<u32> {
        let raw = self.take(4)?;
        Some(u32::from_le_bytes(raw.try_into().ok()?))
    }

    fn u64(&mut self) -> Option<u64> {
        let raw = self.take(8)?;
        Some(u64::from_le_bytes(raw.try_into().ok()?))
    }

    fn bytes(&mut self) -> Option<Vec<u8>> {
        let len = self.u32()? as usize;
        Some(self.take(len)?.to_vec())
    }

    fn str(&mut self) -> Option<String> {
        let raw = self.bytes()?;
        String::from_utf8(raw).ok()
    }

    fn ticket(&mut self) -> Option<Ticket> {
        let lamport = self.u64()?;
        let delimiter = self.u32()?;
        let raw = self.take(ACTOR_ID_SIZE)?;
        let actor = ActorId::from_bytes(raw.try_into().ok()?);
        Some(Ticket::new(lamport, delimiter, actor))
    }

    fn opt_ticket(&mut self) -> Option<Option<Ticket>> {
        match self.u8()? {
            0 => Some(None),
            1 => Some(Some(self.ticket()?)),
            _ => None,
        }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let start = self.pos;
        self.pos += n;
        Some(&self.data[start..start + n])
    }
}
