#![allow(dead_code)]

use attachment_picker_engine::{
    AcquisitionSurface, AttachmentDescriptor, AttachmentMaterializer, AttachmentPicker,
    CallerHandle, FileItemResolver, PermissionCapability, PermissionGate, PermissionStatus,
    RequestId, SurfaceLaunch,
};
use image::{Rgba, RgbaImage};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Interaction context handed to the fakes; carries nothing
pub struct Screen;

pub type Replies = Arc<Mutex<Vec<Result<AttachmentDescriptor, &'static str>>>>;

/// Caller that records outcomes, reducing errors to their reply codes
pub fn recording_caller() -> (CallerHandle, Replies) {
    let replies: Replies = Arc::default();
    let sink = replies.clone();
    let caller = CallerHandle::new(move |outcome| {
        sink.lock().unwrap().push(outcome.map_err(|e| e.code()));
    });
    (caller, replies)
}

#[derive(Default)]
struct GateState {
    granted: HashSet<PermissionCapability>,
    prompts: Vec<(RequestId, PermissionCapability)>,
    refuse_prompts: bool,
}

/// Permission gate whose grants are scripted by the test
#[derive(Clone, Default)]
pub struct FakeGate {
    state: Arc<Mutex<GateState>>,
}

impl FakeGate {
    pub fn granting(capabilities: &[PermissionCapability]) -> Self {
        let gate = Self::default();
        gate.state
            .lock()
            .unwrap()
            .granted
            .extend(capabilities.iter().copied());
        gate
    }

    pub fn refuse_prompts(&self) {
        self.state.lock().unwrap().refuse_prompts = true;
    }

    pub fn prompts(&self) -> Vec<(RequestId, PermissionCapability)> {
        self.state.lock().unwrap().prompts.clone()
    }
}

impl PermissionGate<Screen> for FakeGate {
    fn status(&self, _context: &Screen, capability: PermissionCapability) -> PermissionStatus {
        if self.state.lock().unwrap().granted.contains(&capability) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::NotDetermined
        }
    }

    fn request_prompt(
        &self,
        _context: &Screen,
        capability: PermissionCapability,
        request: RequestId,
    ) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_prompts {
            return Err("prompt suppressed".to_string());
        }
        state.prompts.push((request, capability));
        Ok(())
    }
}

#[derive(Default)]
struct SurfaceState {
    launches: Vec<(RequestId, SurfaceLaunch)>,
    unavailable: Option<String>,
}

/// Surface that records what it was asked to present
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl FakeSurface {
    pub fn make_unavailable(&self, reason: &str) {
        self.state.lock().unwrap().unavailable = Some(reason.to_string());
    }

    pub fn launches(&self) -> Vec<(RequestId, SurfaceLaunch)> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn last_launch(&self) -> Option<(RequestId, SurfaceLaunch)> {
        self.state.lock().unwrap().launches.last().cloned()
    }
}

impl AcquisitionSurface<Screen> for FakeSurface {
    fn launch(&self, _context: &Screen, request: RequestId, launch: &SurfaceLaunch) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.unavailable {
            return Err(reason.clone());
        }
        state.launches.push((request, launch.clone()));
        Ok(())
    }
}

pub struct TestHost {
    pub picker: AttachmentPicker<Screen>,
    pub gate: FakeGate,
    pub surface: FakeSurface,
    pub storage: TempDir,
    pub sources: TempDir,
}

/// Picker wired to fakes, with `granted` capabilities already granted
pub fn host(granted: &[PermissionCapability]) -> TestHost {
    let gate = FakeGate::granting(granted);
    let surface = FakeSurface::default();
    let storage = TempDir::new().expect("Failed to create temp dir");
    let sources = TempDir::new().expect("Failed to create temp dir");
    let materializer = AttachmentMaterializer::new(storage.path(), Box::new(FileItemResolver));
    let picker: AttachmentPicker<Screen> =
        AttachmentPicker::new(Box::new(gate.clone()), Box::new(surface.clone()), materializer);
    TestHost {
        picker,
        gate,
        surface,
        storage,
        sources,
    }
}

impl TestHost {
    /// Write a source file the platform would hand back as a picked item
    pub fn source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.sources.path().join(name);
        std::fs::write(&path, bytes).expect("Failed to write source file");
        path
    }

    pub fn stored_entries(&self) -> usize {
        std::fs::read_dir(self.storage.path())
            .expect("Failed to read storage dir")
            .count()
    }
}

/// Encoded PNG frame, as a camera would leave at its capture target
pub fn png_frame(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .expect("Failed to encode PNG frame");
    buffer
}
