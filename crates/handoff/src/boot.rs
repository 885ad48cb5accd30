use crate::firmware::BootFirmware;
use crate::gate::{gate, wait_for_debugger, ReleaseFlag};

/// Where control goes once the stub is done. Entering it never returns.
pub trait NextStage<I, T> {
    fn enter(self, image: I, table: T) -> !;
}

/// Stub entry sequence with the build-time gate and the exported release flag.
///
/// `next_stage` receives exactly the `image` and `table` firmware passed in.
pub fn boot<F, N>(firmware: &mut F, image: F::Image, table: F::Table, next_stage: N) -> !
where
    F: BootFirmware,
    N: NextStage<F::Image, F::Table>,
{
    let table = bring_up(firmware, image, table);
    gate(firmware);
    next_stage.enter(image, table)
}

/// [`boot`] with the gate mode and release flag chosen by the caller.
pub fn handoff<const DEBUG_WAIT: bool, F, N>(
    firmware: &mut F,
    image: F::Image,
    table: F::Table,
    flag: &ReleaseFlag,
    next_stage: N,
) -> !
where
    F: BootFirmware,
    N: NextStage<F::Image, F::Table>,
{
    let table = bring_up(firmware, image, table);
    wait_for_debugger::<DEBUG_WAIT, F>(firmware, flag);
    next_stage.enter(image, table)
}

/// Everything before the gate. Hands the table back untouched for the jump.
fn bring_up<F: BootFirmware>(firmware: &mut F, image: F::Image, mut table: F::Table) -> F::Table {
    // 1. Firmware runtime first; nothing below may call firmware before this.
    firmware.init_runtime(image, &mut table);

    // 2. Loaded-image lookup. Only used for diagnostics, so a failure is
    //    reported and the boot carries on.
    match firmware.loaded_image(image, &table) {
        Ok(info) => log::debug!("loaded image at {:#x} ({} bytes)", info.base, info.size),
        Err(status) => {
            let _ = writeln!(firmware, "handleprotocol: {:?}", status);
        }
    }

    table
}
