use std::{ cell::Cell, rc::Rc };
use performance_metrics::CycleCounter;

/// A cycle counter the test moves by hand. Clones share the same reading.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn set(&self, value: u64) { self.0.set(value); }
    pub fn advance(&self, cycles: u64) { self.0.set(self.0.get() + cycles); }
}

impl CycleCounter for ManualClock {
    fn read_cycles(&mut self) -> u64 { self.0.get() }
}
