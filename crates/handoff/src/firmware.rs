use core::fmt;

/// Where firmware placed the running image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub base: usize,
    pub size: u64,
}

/// The three firmware services the stub consumes.
///
/// The console-text-output collaborator is the [`fmt::Write`] supertrait.
/// `Image` and `Table` are opaque: the stub never looks inside them, it only
/// hands them back to firmware calls and forwards them to the next stage.
pub trait BootFirmware: fmt::Write {
    type Image: Copy;
    type Table;
    type Status: fmt::Debug;

    /// Runtime bring-up. Must run before any other firmware service.
    fn init_runtime(&mut self, image: Self::Image, table: &mut Self::Table);

    /// Loaded-image protocol lookup for `image`.
    fn loaded_image(
        &mut self,
        image: Self::Image,
        table: &Self::Table,
    ) -> Result<ImageInfo, Self::Status>;
}
