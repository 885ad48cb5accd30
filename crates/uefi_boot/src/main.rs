#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]

#[cfg(target_os = "uefi")]
mod firmware;

#[cfg(target_os = "uefi")]
use uefi::prelude::*;

#[cfg(target_os = "uefi")]
extern "C" {
    // Loader entry, linked in from FERROS_LOADER_LIB (see build.rs).
    fn ferros_loader_main(image: Handle, system_table: SystemTable<Boot>) -> !;
}

#[cfg(target_os = "uefi")]
#[entry]
fn efi_main(image: Handle, system_table: SystemTable<Boot>) -> Status {
    let mut firmware = firmware::UefiFirmware::new(&system_table);

    // Diverges; SUCCESS would only be reported if the loader ever came back,
    // and it never does.
    ferros_handoff::boot(&mut firmware, image, system_table, Loader)
}

/// The linked-in `ferros_loader_main`.
#[cfg(target_os = "uefi")]
struct Loader;

#[cfg(target_os = "uefi")]
impl ferros_handoff::NextStage<Handle, SystemTable<Boot>> for Loader {
    fn enter(self, image: Handle, system_table: SystemTable<Boot>) -> ! {
        // SAFETY: both values are the ones firmware gave efi_main, unmodified.
        // Boot services are still active, which is what the loader expects.
        unsafe { ferros_loader_main(image, system_table) }
    }
}

#[cfg(not(target_os = "uefi"))]
fn main() {
    eprintln!("ferros-boot runs under UEFI firmware; build it with --target x86_64-unknown-uefi (or use `ferros build`)");
    std::process::exit(1);
}
