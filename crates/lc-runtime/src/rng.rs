#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub(crate) fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut mixed = self.state;
        mixed = (mixed ^ (mixed >> 15)).wrapping_mul(mixed | 1);
        mixed ^= mixed.wrapping_add((mixed ^ (mixed >> 7)).wrapping_mul(mixed | 61));
        mixed ^ (mixed >> 14)
    }

    pub(crate) fn pick(&mut self, slots: u32) -> u32 {
        pick_with(slots, || self.next_u32())
    }
}

// Rejection sampling keeps every slot equally likely.
fn pick_with(slots: u32, mut draw: impl FnMut() -> u32) -> u32 {
    let span = u64::from(slots);
    let accepted = (1u64 << 32) / span * span;
    loop {
        let candidate = u64::from(draw());
        if candidate < accepted {
            return (candidate % span) as u32;
        }
    }
}
