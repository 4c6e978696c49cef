use tokio::task::AbortHandle;

use crate::platform::SlotId;

pub(crate) enum SlotKind<E> {
    Entry(Box<E>),
    /// Keeps the height of a removed entry until `expiry` fires.
    Placeholder { height: f32, expiry: AbortHandle },
}

pub(crate) struct Slot<E> {
    pub(crate) id: SlotId,
    pub(crate) kind: SlotKind<E>,
}

/// Ordered slots of the overlay container. Entries keep admission order;
/// a removed entry leaves a placeholder at its own position.
pub(crate) struct Layout<E> {
    slots: Vec<Slot<E>>,
}

impl<E> Default for Layout<E> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<E> Layout<E> {
    pub(crate) fn slots(&self) -> &[Slot<E>] {
        &self.slots
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.kind, SlotKind::Entry(_)))
            .count()
    }

    pub(crate) fn position_of(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    /// Linear scan; the overlay only ever holds a handful of entries.
    pub(crate) fn find_entry(&self, mut predicate: impl FnMut(&E) -> bool) -> Option<SlotId> {
        self.slots.iter().find_map(|slot| match &slot.kind {
            SlotKind::Entry(entry) if predicate(&**entry) => Some(slot.id),
            _ => None,
        })
    }

    pub(crate) fn entry_mut(&mut self, id: SlotId) -> Option<&mut E> {
        self.slots.iter_mut().find_map(|slot| match &mut slot.kind {
            SlotKind::Entry(entry) if slot.id == id => Some(entry.as_mut()),
            _ => None,
        })
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.slots.iter_mut().filter_map(|slot| match &mut slot.kind {
            SlotKind::Entry(entry) => Some(entry.as_mut()),
            SlotKind::Placeholder { .. } => None,
        })
    }

    /// Appends an entry and returns its position.
    pub(crate) fn push_entry(&mut self, id: SlotId, entry: E) -> usize {
        self.slots.push(Slot {
            id,
            kind: SlotKind::Entry(Box::new(entry)),
        });
        self.slots.len() - 1
    }

    /// Swaps entry `id` for a placeholder in the same position. Returns the
    /// removed entry and its position.
    pub(crate) fn replace_with_placeholder(
        &mut self,
        id: SlotId,
        placeholder: SlotId,
        height: f32,
        expiry: AbortHandle,
    ) -> Option<(usize, E)> {
        let position = self.position_of(id)?;
        if !matches!(self.slots[position].kind, SlotKind::Entry(_)) {
            expiry.abort();
            return None;
        }
        let removed = std::mem::replace(
            &mut self.slots[position],
            Slot {
                id: placeholder,
                kind: SlotKind::Placeholder { height, expiry },
            },
        );
        match removed.kind {
            SlotKind::Entry(entry) => Some((position, *entry)),
            SlotKind::Placeholder { .. } => None,
        }
    }

    /// Takes entry `id` out without leaving a placeholder behind.
    pub(crate) fn remove_entry(&mut self, id: SlotId) -> Option<E> {
        let position = self.position_of(id)?;
        if !matches!(self.slots[position].kind, SlotKind::Entry(_)) {
            return None;
        }
        match self.slots.remove(position).kind {
            SlotKind::Entry(entry) => Some(*entry),
            SlotKind::Placeholder { .. } => None,
        }
    }

    pub(crate) fn remove_placeholder(&mut self, id: SlotId) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        if !matches!(self.slots[position].kind, SlotKind::Placeholder { .. }) {
            return false;
        }
        self.slots.remove(position);
        true
    }

    /// Empties the layout, cancelling placeholder expiries. Returns the
    /// entries in order.
    pub(crate) fn clear(&mut self) -> Vec<E> {
        self.slots
            .drain(..)
            .filter_map(|slot| match slot.kind {
                SlotKind::Entry(entry) => Some(*entry),
                SlotKind::Placeholder { expiry, .. } => {
                    expiry.abort();
                    None
                }
            })
            .collect()
    }
}
