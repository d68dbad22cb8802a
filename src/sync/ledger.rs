#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EditId(u64);

/// Optimistic edits awaiting confirmation, each with the value it replaced.
#[derive(Debug)]
pub struct Ledger<T> {
    next: u64,
    pending: Vec<(EditId, T)>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Self {
            next: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Ledger<T> {
    /// Record the prior state of an edit that has just been applied locally.
    pub fn record(&mut self, prior: T) -> EditId {
        self.next += 1;
        let id = EditId(self.next);
        self.pending.push((id, prior));
        id
    }

    fn take(&mut self, id: EditId) -> Option<T> {
        let pos = self.pending.iter().position(|(e, _)| *e == id)?;
        Some(self.pending.remove(pos).1)
    }

    /// The server agreed; forget the prior state.
    pub fn commit(&mut self, id: EditId) -> bool {
        self.take(id).is_some()
    }

    /// The server refused; hand back the prior state to restore.
    pub fn rollback(&mut self, id: EditId) -> Option<T> {
        self.take(id)
    }

    /// Edits recorded after `id`, whose priors may include its effect.
    pub fn pending_after_mut(&mut self, id: EditId) -> impl Iterator<Item = &mut T> {
        self.pending
            .iter_mut()
            .filter(move |(e, _)| e.0 > id.0)
            .map(|(_, t)| t)
    }

    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.pending.iter().map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
