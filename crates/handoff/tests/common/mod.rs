//! Scripted firmware and a next-stage stand-in for driving the handoff on the host.

#![allow(dead_code)]

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ferros_handoff::{handoff, BootFirmware, ImageInfo, NextStage, ReleaseFlag};

#[derive(Debug)]
pub struct FakeImage(pub u64);

#[derive(Debug)]
pub struct FakeTable {
    pub revision: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeStatus {
    NotFound,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    InitRuntime,
    LoadedImage,
    Console,
    NextStage,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub struct ScriptedFirmware {
    pub events: EventLog,
    pub console: String,
    pub console_writes: usize,
    pub query: Result<ImageInfo, FakeStatus>,
}

impl ScriptedFirmware {
    pub fn with_query(query: Result<ImageInfo, FakeStatus>) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            console: String::new(),
            console_writes: 0,
            query,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl fmt::Write for ScriptedFirmware {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.record(Event::Console);
        self.console_writes += 1;
        self.console.push_str(s);
        Ok(())
    }
}

impl BootFirmware for ScriptedFirmware {
    type Image = &'static FakeImage;
    type Table = &'static FakeTable;
    type Status = FakeStatus;

    fn init_runtime(&mut self, _image: Self::Image, _table: &mut Self::Table) {
        self.record(Event::InitRuntime);
    }

    fn loaded_image(&mut self, _image: Self::Image, _table: &Self::Table) -> Result<ImageInfo, FakeStatus> {
        self.record(Event::LoadedImage);
        self.query
    }
}

/// Unwind payload the next-stage stand-in throws so the test gets control back.
pub struct HandedOff;

/// What the next-stage stand-in saw.
#[derive(Debug, Default)]
pub struct Captured {
    pub calls: usize,
    pub image: Option<*const FakeImage>,
    pub table: Option<*const FakeTable>,
}

// The raw pointers are only compared, never dereferenced.
unsafe impl Send for Captured {}

pub fn leak_handles(image: u64, revision: u32) -> (&'static FakeImage, &'static FakeTable) {
    (Box::leak(Box::new(FakeImage(image))), Box::leak(Box::new(FakeTable { revision })))
}

/// Next-stage stand-in: records what it was entered with, then unwinds
/// with [`HandedOff`] so the test gets control back.
pub struct RecordingStage {
    events: EventLog,
    sink: Arc<Mutex<Captured>>,
}

impl NextStage<&'static FakeImage, &'static FakeTable> for RecordingStage {
    fn enter(self, image: &'static FakeImage, table: &'static FakeTable) -> ! {
        self.events.lock().unwrap().push(Event::NextStage);
        {
            let mut seen = self.sink.lock().unwrap();
            seen.calls += 1;
            seen.image = Some(image as *const FakeImage);
            seen.table = Some(table as *const FakeTable);
        }
        drop(self);
        panic::resume_unwind(Box::new(HandedOff))
    }
}

/// Runs `enter` (which must end in a handoff to the given stage) and returns
/// what the next stage received.
pub fn capture_handoff(
    firmware: &mut ScriptedFirmware,
    enter: impl FnOnce(&mut ScriptedFirmware, RecordingStage),
) -> Captured {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let stage = RecordingStage {
        events: Arc::clone(&firmware.events),
        sink: Arc::clone(&captured),
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| enter(firmware, stage)));

    let payload = outcome.expect_err("handoff returned to its caller");
    assert!(payload.downcast_ref::<HandedOff>().is_some(), "handoff unwound for another reason");

    Arc::try_unwrap(captured)
        .expect("next stage kept a reference to its capture")
        .into_inner()
        .unwrap()
}

/// Drives the handoff with an explicit gate mode and flag.
pub fn run_to_handoff<const DEBUG_WAIT: bool>(
    firmware: &mut ScriptedFirmware,
    image: &'static FakeImage,
    table: &'static FakeTable,
    flag: &ReleaseFlag,
) -> Captured {
    capture_handoff(firmware, |firmware, stage| {
        handoff::<DEBUG_WAIT, _, _>(firmware, image, table, flag, stage)
    })
}

/// Spins until `cond` holds, failing the test after `limit`.
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < limit, "condition not reached within {:?}", limit);
        thread::sleep(Duration::from_millis(1));
    }
}

pub fn leak_flag() -> &'static ReleaseFlag {
    Box::leak(Box::new(ReleaseFlag::new()))
}
