//! Fake access strategies.
//!
//! * `RecordingBackend` logs the effective address of every access.
//! * `MemoryBackend` persists writes in a shared map.
//! * `SimBackend` drives a `SimBus` directly, without the mailbox.
//! * `TripwireBackend` wraps a `SimBackend` and raises a cancel token when a
//!   chosen address is written.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use apeboot_core::access::{Backend, RegisterAccess};
use apeboot_core::common::{AccessKind, CancelToken, PhysAddr, Result};
use apeboot_core::sim::SimBus;

/// One access seen by a recording strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub kind: AccessKind,
    pub address: PhysAddr,
    pub value: u32,
}

pub type Log = Arc<Mutex<Vec<Access>>>;

/// Records every access and answers reads with the effective address.
pub struct RecordingAccess {
    base: PhysAddr,
    log: Log,
}

impl RegisterAccess for RecordingAccess {
    fn name(&self) -> &str {
        "recording"
    }

    fn base(&self) -> PhysAddr {
        self.base
    }

    fn read(&self, _cached: u32, offset: u32) -> Result<u32> {
        let address = self.base.offset(offset);
        self.log.lock().unwrap().push(Access {
            kind: AccessKind::Read,
            address,
            value: address.val(),
        });
        Ok(address.val())
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        self.log.lock().unwrap().push(Access {
            kind: AccessKind::Write,
            address: self.base.offset(offset),
            value,
        });
        Ok(value)
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    pub log: Log,
    /// Number of strategies handed out.
    pub handed_out: Mutex<usize>,
}

impl RecordingBackend {
    pub fn accesses(&self) -> Vec<Access> {
        self.log.lock().unwrap().clone()
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        *self.handed_out.lock().unwrap() += 1;
        Arc::new(RecordingAccess {
            base,
            log: Arc::clone(&self.log),
        })
    }
}

/// Word-addressed memory shared by every strategy it hands out.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub words: Arc<Mutex<HashMap<u32, u32>>>,
}

struct MemoryAccess {
    base: PhysAddr,
    words: Arc<Mutex<HashMap<u32, u32>>>,
}

impl RegisterAccess for MemoryAccess {
    fn name(&self) -> &str {
        "memory"
    }

    fn base(&self) -> PhysAddr {
        self.base
    }

    fn read(&self, _cached: u32, offset: u32) -> Result<u32> {
        let words = self.words.lock().unwrap();
        Ok(words.get(&self.base.offset(offset).val()).copied().unwrap_or(0))
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        let _ = self
            .words
            .lock()
            .unwrap()
            .insert(self.base.offset(offset).val(), value);
        Ok(value)
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        Arc::new(MemoryAccess {
            base,
            words: Arc::clone(&self.words),
        })
    }
}

/// Calls straight into a simulated bus.
#[derive(Clone)]
pub struct SimBackend {
    pub bus: Arc<Mutex<SimBus>>,
}

impl SimBackend {
    pub fn new(bus: SimBus) -> Self {
        Self {
            bus: Arc::new(Mutex::new(bus)),
        }
    }

    pub fn read(&self, address: PhysAddr) -> u32 {
        self.bus.lock().unwrap().read_u32(address)
    }
}

struct SimAccess {
    base: PhysAddr,
    bus: Arc<Mutex<SimBus>>,
}

impl RegisterAccess for SimAccess {
    fn name(&self) -> &str {
        "sim"
    }

    fn base(&self) -> PhysAddr {
        self.base
    }

    fn read(&self, _cached: u32, offset: u32) -> Result<u32> {
        Ok(self.bus.lock().unwrap().read_u32(self.base.offset(offset)))
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        self.bus
            .lock()
            .unwrap()
            .write_u32(self.base.offset(offset), value);
        Ok(value)
    }
}

impl Backend for SimBackend {
    fn name(&self) -> &str {
        "sim"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        Arc::new(SimAccess {
            base,
            bus: Arc::clone(&self.bus),
        })
    }
}

/// Forwards to a simulated bus and cancels `token` once `address` is written.
#[derive(Clone)]
pub struct TripwireBackend {
    pub sim: SimBackend,
    pub address: PhysAddr,
    pub token: CancelToken,
}

struct TripwireAccess {
    inner: Arc<dyn RegisterAccess>,
    address: PhysAddr,
    token: CancelToken,
}

impl RegisterAccess for TripwireAccess {
    fn name(&self) -> &str {
        "tripwire"
    }

    fn base(&self) -> PhysAddr {
        self.inner.base()
    }

    fn read(&self, cached: u32, offset: u32) -> Result<u32> {
        self.inner.read(cached, offset)
    }

    fn write(&self, value: u32, offset: u32) -> Result<u32> {
        let written = self.inner.write(value, offset)?;
        if self.inner.base().offset(offset) == self.address {
            self.token.cancel();
        }
        Ok(written)
    }
}

impl Backend for TripwireBackend {
    fn name(&self) -> &str {
        "tripwire"
    }

    fn access(&self, base: PhysAddr) -> Arc<dyn RegisterAccess> {
        Arc::new(TripwireAccess {
            inner: self.sim.access(base),
            address: self.address,
            token: self.token.clone(),
        })
    }
}
