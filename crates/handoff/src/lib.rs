//! Boot handoff core for the FerrOS UEFI stub.
//!
//! Firmware enters the stub once. The stub brings up the firmware runtime,
//! asks for the loaded-image descriptor (diagnostics only), optionally parks
//! until a debugger attaches, then jumps to the loader and never comes back.
//!
//! Everything here is generic over [`BootFirmware`] so the sequence can be
//! exercised on the host against a scripted firmware.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod boot;
pub mod firmware;
pub mod gate;

pub use boot::{boot, handoff, NextStage};
pub use firmware::{BootFirmware, ImageInfo};
pub use gate::{gate, wait_for_debugger, ReleaseFlag, DEBUG_WAIT_ENABLED, FERROS_DEBUG_WAIT};
