/// Proof of which request a response belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ticket(u64);

/// Last-request-wins counter for one kind of fetch.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    /// Start a new request, making every earlier ticket stale.
    pub fn issue(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }

    /// Drop interest in whatever is in flight.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }
}
