//! Debugger attach gate.
//!
//! With the `debug-wait` feature the stub announces itself on the console and
//! spins on [`FERROS_DEBUG_WAIT`] until something outside the program (gdb
//! attached through QEMU's stub, usually) writes zero into it. There is no
//! timeout. Without the feature the gate compiles down to nothing.

use core::cell::UnsafeCell;
use core::fmt::Write;
use core::ptr;

/// Build-time switch for the gate.
pub const DEBUG_WAIT_ENABLED: bool = cfg!(feature = "debug-wait");

/// A byte that only an external agent is expected to clear.
///
/// Reads and writes are volatile so the wait loop re-reads memory on every
/// iteration. It is not an atomic: inside the program there is no second
/// thread to synchronize with.
#[repr(transparent)]
pub struct ReleaseFlag(UnsafeCell<u8>);

// SAFETY: the only writers are a debugger poking memory and `arm`/`release`,
// all through single-byte volatile stores.
unsafe impl Sync for ReleaseFlag {}

impl ReleaseFlag {
    pub const WAITING: u8 = 1;
    pub const RELEASED: u8 = 0;

    pub const fn new() -> Self {
        Self(UnsafeCell::new(Self::RELEASED))
    }

    pub fn arm(&self) {
        // SAFETY: the cell is always valid for a byte-sized write.
        unsafe { ptr::write_volatile(self.0.get(), Self::WAITING) }
    }

    /// What the debugger does by hand. Exposed for harnesses that stand in for one.
    pub fn release(&self) {
        // SAFETY: as in `arm`.
        unsafe { ptr::write_volatile(self.0.get(), Self::RELEASED) }
    }

    pub fn is_waiting(&self) -> bool {
        // SAFETY: the cell is always valid for a byte-sized read.
        unsafe { ptr::read_volatile(self.0.get()) != Self::RELEASED }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.0.get()
    }
}

impl Default for ReleaseFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The flag gdb clears: `set {unsigned char}&FERROS_DEBUG_WAIT = 0`.
#[no_mangle]
pub static FERROS_DEBUG_WAIT: ReleaseFlag = ReleaseFlag::new();

/// Runs the gate as configured at build time.
pub fn gate<W: Write + ?Sized>(console: &mut W) {
    wait_for_debugger::<DEBUG_WAIT_ENABLED, W>(console, &FERROS_DEBUG_WAIT);
}

/// Gate body, instantiated once per build mode.
///
/// `ENABLED = false` returns before touching `console` or `flag`.
pub fn wait_for_debugger<const ENABLED: bool, W: Write + ?Sized>(console: &mut W, flag: &ReleaseFlag) {
    if !ENABLED {
        return;
    }

    // Armed before the announcement: a debugger reacting to it must not have
    // its release overwritten.
    flag.arm();

    // Console failures must not keep the debugger out.
    let _ = writeln!(console, "Waiting for GDB (release flag at {:p})", flag.as_ptr());

    while flag.is_waiting() {
        core::hint::spin_loop();
    }

    let _ = writeln!(console, "Linked with GDB");
}
