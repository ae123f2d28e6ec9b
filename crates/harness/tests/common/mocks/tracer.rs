use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use tbsim_core::sim::Tracer;
use tbsim_core::soc::PinSnapshot;

/// Samples shared between a `RecordingTracer` and the test that installed it.
pub type Samples = Rc<RefCell<Vec<(u64, PinSnapshot)>>>;

/// Tracer that keeps every sample in memory.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub samples: Samples,
    pub closed: Rc<RefCell<bool>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for RecordingTracer {
    fn sample(&mut self, time: u64, pins: &PinSnapshot) -> io::Result<()> {
        self.samples.borrow_mut().push((time, *pins));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}

/// Tracer whose sink always fails.
#[derive(Debug, Default)]
pub struct BrokenTracer;

impl Tracer for BrokenTracer {
    fn sample(&mut self, _time: u64, _pins: &PinSnapshot) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}
