use crate::types::Sample;

/// Fixed-capacity rolling store of intensity readings.
///
/// The length never changes: `push` drops the oldest slot and appends the
/// newest, so the buffer always spans exactly N sampling ticks and its wall
/// duration is N × tick interval. Empty slots (`None`) mean "no reading at
/// that tick" — silence, or zero breath pressure.
///
/// `push` is the only mutator. Readers get an immutable slice and derive
/// whatever they need (smoothing, statistics) without touching the buffer.
pub struct History {
    slots: Vec<Option<Sample>>,
}

impl History {
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "history length must be non-zero");
        Self {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() // never true; length is fixed and non-zero
    }

    /// Oldest-to-newest view of the buffer.
    pub fn slots(&self) -> &[Option<Sample>] {
        &self.slots
    }

    /// Evict the oldest slot and append the newest.
    pub fn push(&mut self, slot: Option<Sample>) {
        self.slots.rotate_left(1);
        let last = self.slots.len() - 1;
        self.slots[last] = slot;
    }

    /// Reset every slot to empty.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}
