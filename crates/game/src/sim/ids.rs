/// Hands out session-unique ids. Never reissues a value it has handed out.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next_id: u32,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn starting_at(first: u32) -> Self {
        Self { next_id: first }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}
