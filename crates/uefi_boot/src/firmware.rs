use core::fmt::{self, Write};

use ferros_handoff::{BootFirmware, ImageInfo};
use uefi::prelude::*;
use uefi::proto::loaded_image::LoadedImage;
use uefi::table::boot::{OpenProtocolAttributes, OpenProtocolParams};

/// Firmware services backed by the real UEFI tables.
pub struct UefiFirmware {
    // Console-only view of the system table; the original is forwarded to the loader.
    console: SystemTable<Boot>,
}

impl UefiFirmware {
    pub fn new(system_table: &SystemTable<Boot>) -> Self {
        // SAFETY: the copy is only used for console output, and only while boot
        // services are live (everything before the jump to the loader).
        let console = unsafe { system_table.unsafe_clone() };
        Self { console }
    }
}

impl Write for UefiFirmware {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.stdout().write_str(s)
    }
}

impl BootFirmware for UefiFirmware {
    type Image = Handle;
    type Table = SystemTable<Boot>;
    type Status = Status;

    fn init_runtime(&mut self, _image: Handle, table: &mut SystemTable<Boot>) {
        // Also installs the console logger and the panic handler. Bad firmware
        // tables are outside what the stub can diagnose.
        uefi_services::init(table).expect("failed to initialize UEFI services");
    }

    fn loaded_image(&mut self, image: Handle, table: &SystemTable<Boot>) -> Result<ImageInfo, Status> {
        let bt = table.boot_services();

        // GetProtocol is the HandleProtocol equivalent: no exclusive open, the
        // image stays usable by whatever runs next.
        let loaded_image = unsafe {
            bt.open_protocol::<LoadedImage>(
                OpenProtocolParams {
                    handle: image,
                    agent: image,
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
        }
        .map_err(|e| e.status())?;

        let (base, size) = loaded_image.info();
        Ok(ImageInfo {
            base: base as usize,
            size,
        })
    }
}
