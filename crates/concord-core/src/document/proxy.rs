use crate::json::{Array, Element, Object, Primitive, Text, Value};
use crate::operation::{Add, Edit, Operation, Remove, Select, Set};
use crate::time::Ticket;

use super::change_context::ChangeContext;

/// Mutation handle for an object element. Every call issues the matching
/// operation, applies it locally and buffers it in the change context.
pub struct ObjectProxy<'a, 'r> {
    ctx: &'a mut ChangeContext<'r>,
    created_at: Ticket,
}

impl<'a, 'r> ObjectProxy<'a, 'r> {
    pub(crate) fn new(ctx: &'a mut ChangeContext<'r>, created_at: Ticket) -> Self {
        ObjectProxy { ctx, created_at }
    }

    /// Sets `key` to a primitive value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Primitive(Primitive::new(value.into(), ticket));
        self.ctx
            .apply_and_push(Operation::Set(Set::new(self.created_at, key, elem, ticket)));
    }

    pub fn set_new_object(&mut self, key: &str) -> ObjectProxy<'_, 'r> {
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Object(Object::new(ticket));
        self.ctx
            .apply_and_push(Operation::Set(Set::new(self.created_at, key, elem, ticket)));
        ObjectProxy::new(&mut *self.ctx, ticket)
    }

    pub fn set_new_array(&mut self, key: &str) -> ArrayProxy<'_, 'r> {
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Array(Array::new(ticket));
        self.ctx
            .apply_and_push(Operation::Set(Set::new(self.created_at, key, elem, ticket)));
        ArrayProxy {
            ctx: &mut *self.ctx,
            created_at: ticket,
        }
    }

    pub fn set_new_text(&mut self, key: &str) -> TextProxy<'_, 'r> {
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Text(Text::new(ticket));
        self.ctx
            .apply_and_push(Operation::Set(Set::new(self.created_at, key, elem, ticket)));
        TextProxy {
            ctx: &mut *self.ctx,
            created_at: ticket,
        }
    }

    /// Removes the current value at `key`, if any.
    pub fn remove(&mut self, key: &str) {
        let Some(target) = self.member(key) else {
            return;
        };
        let ticket = self.ctx.issue_ticket();
        self.ctx.apply_and_push(Operation::Remove(Remove::new(
            self.created_at,
            target,
            ticket,
        )));
    }

    /// Proxy for an existing nested object.
    pub fn object(&mut self, key: &str) -> Option<ObjectProxy<'_, 'r>> {
        let target = self.member(key)?;
        if matches!(self.ctx.root().element(target), Some(Element::Object(_))) {
            Some(ObjectProxy::new(&mut *self.ctx, target))
        } else {
            None
        }
    }

    /// Proxy for an existing nested array.
    pub fn array(&mut self, key: &str) -> Option<ArrayProxy<'_, 'r>> {
        let target = self.member(key)?;
        if matches!(self.ctx.root().element(target), Some(Element::Array(_))) {
            Some(ArrayProxy {
                ctx: &mut *self.ctx,
                created_at: target,
            })
        } else {
            None
        }
    }

    /// Proxy for an existing nested text.
    pub fn text(&mut self, key: &str) -> Option<TextProxy<'_, 'r>> {
        let target = self.member(key)?;
        if matches!(self.ctx.root().element(target), Some(Element::Text(_))) {
            Some(TextProxy {
                ctx: &mut *self.ctx,
                created_at: target,
            })
        } else {
            None
        }
    }

    fn member(&self, key: &str) -> Option<Ticket> {
        let Some(Element::Object(obj)) = self.ctx.root().element(self.created_at) else {
            return None;
        };
        let target = obj.get(key)?;
        let elem = self.ctx.root().element(target)?;
        if elem.deleted_at().is_some() {
            return None;
        }
        Some(target)
    }
}

/// Mutation handle for an array element.
pub struct ArrayProxy<'a, 'r> {
    ctx: &'a mut ChangeContext<'r>,
    created_at: Ticket,
}

impl<'a, 'r> ArrayProxy<'a, 'r> {
    /// Appends a primitive value.
    pub fn add(&mut self, value: impl Into<Value>) {
        let Some(prev) = self.last_created_at() else {
            return;
        };
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Primitive(Primitive::new(value.into(), ticket));
        self.ctx.apply_and_push(Operation::Add(Add::new(
            self.created_at,
            prev,
            elem,
            ticket,
        )));
    }

    pub fn add_new_object(&mut self) -> Option<ObjectProxy<'_, 'r>> {
        let prev = self.last_created_at()?;
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Object(Object::new(ticket));
        self.ctx.apply_and_push(Operation::Add(Add::new(
            self.created_at,
            prev,
            elem,
            ticket,
        )));
        Some(ObjectProxy::new(&mut *self.ctx, ticket))
    }

    pub fn add_new_array(&mut self) -> Option<ArrayProxy<'_, 'r>> {
        let prev = self.last_created_at()?;
        let ticket = self.ctx.issue_ticket();
        let elem = Element::Array(Array::new(ticket));
        self.ctx.apply_and_push(Operation::Add(Add::new(
            self.created_at,
            prev,
            elem,
            ticket,
        )));
        Some(ArrayProxy {
            ctx: &mut *self.ctx,
            created_at: ticket,
        })
    }

    /// Removes the element at the visible index.
    pub fn remove(&mut self, idx: usize) {
        let target = match self.ctx.root().element(self.created_at) {
            Some(Element::Array(arr)) => arr.get(idx),
            _ => return,
        };
        let Some(target) = target else {
            return;
        };
        let ticket = self.ctx.issue_ticket();
        self.ctx.apply_and_push(Operation::Remove(Remove::new(
            self.created_at,
            target,
            ticket,
        )));
    }

    pub fn len(&self) -> usize {
        match self.ctx.root().element(self.created_at) {
            Some(Element::Array(arr)) => arr.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn last_created_at(&self) -> Option<Ticket> {
        match self.ctx.root().element(self.created_at) {
            Some(Element::Array(arr)) => Some(arr.last_created_at()),
            _ => None,
        }
    }
}

/// Mutation handle for a text element.
pub struct TextProxy<'a, 'r> {
    ctx: &'a mut ChangeContext<'r>,
    created_at: Ticket,
}

impl<'a, 'r> TextProxy<'a, 'r> {
    /// Replaces the character range `[from, to)` with `content`.
    pub fn edit(&mut self, from: usize, to: usize, content: &str) {
        if to < from {
            return;
        }
        let ticket = self.ctx.issue_ticket();
        let Some(Element::Text(text)) = self.ctx.root_mut().element_mut(self.created_at) else {
            return;
        };
        let from_pos = text.find_pos(from);
        let to_pos = text.find_pos(to);
        let Some(created_map) = text.edit(from_pos, to_pos, None, content, ticket) else {
            return;
        };
        self.ctx.push(Operation::Edit(Edit::new(
            self.created_at,
            from_pos,
            to_pos,
            created_map,
            content,
            ticket,
        )));
    }

    /// Publishes this replica's selection over `[from, to)`.
    pub fn select(&mut self, from: usize, to: usize) {
        if to < from {
            return;
        }
        let ticket = self.ctx.issue_ticket();
        let Some(Element::Text(text)) = self.ctx.root_mut().element_mut(self.created_at) else {
            return;
        };
        let from_pos = text.find_pos(from);
        let to_pos = text.find_pos(to);
        text.select(from_pos, to_pos, ticket);
        self.ctx.push(Operation::Select(Select::new(
            self.created_at,
            from_pos,
            to_pos,
            ticket,
        )));
    }

    pub fn value(&self) -> String {
        match self.ctx.root().element(self.created_at) {
            Some(Element::Text(text)) => text.value(),
            _ => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self.ctx.root().element(self.created_at) {
            Some(Element::Text(text)) => text.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
