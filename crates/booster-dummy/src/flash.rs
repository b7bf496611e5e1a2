//! Emulated SPI NOR flash behind a mapped/direct controller

use booster_core::device::SpiFlash;
use booster_core::geometry::{ERASE_SECTOR_SIZE, PROGRAM_PAGE_SIZE};

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Identity returned by `read_id`
    pub spi_id: u32,
    /// Flash size in bytes
    pub size: usize,
    /// Number of `is_busy` polls an erase or program stays busy for
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            spi_id: 0x00C2_2016, // MX25R1635F
            size: 2 * 1024 * 1024,
            busy_polls: 0,
        }
    }
}

/// A flash operation, in the order it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOp {
    /// Controller mode change
    SetDirect(bool),
    /// Sector erase at the given address
    Erase(u32),
    /// Page program of `len` bytes at `addr`
    Program {
        /// Start address
        addr: u32,
        /// Bytes programmed
        len: usize,
    },
    /// Identity read over direct access
    ReadId,
}

/// Misuse of the controller that real hardware would not tolerate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A command was issued while an erase or program was in flight
    CommandWhileBusy(FlashOp),
    /// A direct-access command was issued while memory-mapped
    CommandWhileMapped(FlashOp),
    /// A memory-mapped read was issued in direct access mode
    MappedReadWhileDirect {
        /// Start address of the read
        addr: u32,
    },
    /// A memory-mapped read was issued while an erase or program ran
    MappedReadWhileBusy {
        /// Start address of the read
        addr: u32,
    },
    /// A program crossed a page boundary
    PageOverrun {
        /// Start address
        addr: u32,
        /// Bytes programmed
        len: usize,
    },
    /// An access ran past the end of the chip
    OutOfBounds {
        /// Start address
        addr: u32,
        /// Access length
        len: usize,
    },
}

/// Dummy flash controller
///
/// Emulates erase-to-0xFF and program-clears-bits semantics, a busy flag
/// and the controller's exclusive mapped/direct modes. The controller
/// starts memory-mapped, as it does out of reset.
#[derive(Debug)]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    direct: bool,
    busy_remaining: u32,
    ops: Vec<FlashOp>,
    violations: Vec<Violation>,
}

impl DummyFlash {
    /// Create a new blank dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            direct: false,
            busy_remaining: 0,
            ops: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = initial_data.len().min(flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Operations issued so far
    pub fn ops(&self) -> &[FlashOp] {
        &self.ops
    }

    /// Erase and program operations issued so far
    pub fn writes(&self) -> impl Iterator<Item = &FlashOp> + '_ {
        self.ops
            .iter()
            .filter(|op| matches!(op, FlashOp::Erase(_) | FlashOp::Program { .. }))
    }

    /// Controller misuse detected so far
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether the controller is in direct access mode
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Forget recorded operations and violations
    pub fn clear_log(&mut self) {
        self.ops.clear();
        self.violations.clear();
    }

    fn violation(&mut self, violation: Violation) {
        log::error!("Dummy flash: {:?}", violation);
        self.violations.push(violation);
    }

    /// Record a direct-access command, checking mode and busy state
    fn command(&mut self, op: FlashOp) {
        if !self.direct {
            self.violation(Violation::CommandWhileMapped(op.clone()));
        }
        if self.busy_remaining > 0 {
            self.violation(Violation::CommandWhileBusy(op.clone()));
        }
        self.ops.push(op);
    }

    fn range(&mut self, addr: u32, len: usize) -> Option<core::ops::Range<usize>> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Some(start..end),
            _ => {
                self.violation(Violation::OutOfBounds { addr, len });
                None
            }
        }
    }
}

impl SpiFlash for DummyFlash {
    fn is_busy(&mut self) -> bool {
        if self.busy_remaining == 0 {
            return false;
        }
        self.busy_remaining -= 1;
        true
    }

    fn begin_erase(&mut self, addr: u32) {
        self.command(FlashOp::Erase(addr));
        let base = addr & !(ERASE_SECTOR_SIZE as u32 - 1);
        if let Some(range) = self.range(base, ERASE_SECTOR_SIZE) {
            self.data[range].fill(0xFF);
        }
        self.busy_remaining = self.config.busy_polls;
    }

    fn begin_write(&mut self, addr: u32, data: &[u8]) {
        self.command(FlashOp::Program {
            addr,
            len: data.len(),
        });
        let page_offset = addr as usize % PROGRAM_PAGE_SIZE;
        if page_offset + data.len() > PROGRAM_PAGE_SIZE {
            self.violation(Violation::PageOverrun {
                addr,
                len: data.len(),
            });
        }
        if let Some(range) = self.range(addr, data.len()) {
            // Flash programming: can only change 1 -> 0
            for (cell, byte) in self.data[range].iter_mut().zip(data) {
                *cell &= byte;
            }
        }
        self.busy_remaining = self.config.busy_polls;
    }

    fn read_id(&mut self) -> u32 {
        self.command(FlashOp::ReadId);
        if self.direct {
            self.config.spi_id
        } else {
            0xFFFF_FFFF
        }
    }

    fn set_direct_access(&mut self, enabled: bool) {
        self.ops.push(FlashOp::SetDirect(enabled));
        self.direct = enabled;
    }

    fn read_mapped(&mut self, addr: u32, buf: &mut [u8]) {
        if self.direct {
            self.violation(Violation::MappedReadWhileDirect { addr });
        }
        if self.busy_remaining > 0 {
            self.violation(Violation::MappedReadWhileBusy { addr });
        }
        if let Some(range) = self.range(addr, buf.len()) {
            buf.copy_from_slice(&self.data[range]);
        }
    }
}
