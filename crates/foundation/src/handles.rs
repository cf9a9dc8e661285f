/// Generational handle: a slot index plus the generation that slot had when
/// the handle was issued. A handle outlives its slot safely; once the slot is
/// reused the generation no longer matches and lookups miss.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Issues generational handles and recycles released slots.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    live: Vec<bool>,
    free: Vec<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.live[slot] = true;
            return Handle::new(index, self.generations[slot]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.live.push(true);
        Handle::new(index, 0)
    }

    /// Releases `handle`. Returns `false` for stale or unknown handles.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = handle.index as usize;
        self.live[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        let slot = handle.index as usize;
        self.live.get(slot).copied().unwrap_or(false) && self.generations[slot] == handle.generation
    }

    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// Releases every live handle, bumping each slot's generation.
    pub fn release_all(&mut self) {
        for slot in 0..self.live.len() {
            if self.live[slot] {
                self.live[slot] = false;
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.free.push(slot as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HandleAllocator;

    #[test]
    fn released_slot_is_reused_with_new_generation() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.release(a));
        let b = alloc.allocate();

        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(!alloc.is_live(a));
        assert!(alloc.is_live(b));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.release(a));
        assert!(!alloc.release(a));
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn release_all_invalidates_everything() {
        let mut alloc = HandleAllocator::new();
        let handles: Vec<_> = (0..4).map(|_| alloc.allocate()).collect();
        alloc.release_all();
        assert_eq!(alloc.live_count(), 0);
        assert!(handles.iter().all(|h| !alloc.is_live(*h)));
    }
}
