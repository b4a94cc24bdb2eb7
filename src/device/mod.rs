//! Camera driver interface.
//!
//! The command surface never talks to hardware directly. Everything that
//! touches a device goes through two traits:
//! - [`Driver`] - the model catalog, port list, auto-detection and opening
//! - [`Camera`] - file, folder, capture and text operations on a bound device
//!
//! Two implementations ship with the crate:
//! - [`DirectoryDriver`] - the "Directory Browse" pseudo-model over a local directory
//! - [`MemoryDriver`] - a scriptable in-memory device; test support only,
//!   never used by the binary

mod directory;
mod error;
mod memory;
mod types;

pub use directory::{DirectoryCamera, DirectoryDriver};
pub use error::DeviceError;
// Test support, public for the integration tests.
pub use memory::{MemoryCamera, MemoryDriver, MemoryState};
pub use types::{
    join_folder, Abilities, CameraFile, CameraFilePath, CaptureKind, CaptureSupport,
    DetectedCamera, DriverStatus, FileKind, PortInfo, PortSupport, PortType, DIRECTORY_BROWSE,
};

use crate::context::Context;

/// Callback installed on a bound camera for status or message text.
pub type Sink = Box<dyn Fn(&str) + Send>;

/// Catalog side of a driver: what models exist, which ports are present,
/// and how to open a camera once a model and port are chosen.
pub trait Driver {
    /// Capability descriptors of every supported model, in catalog order.
    fn abilities(&self, ctx: &Context) -> Result<Vec<Abilities>, DeviceError>;

    /// Ports present on this machine.
    fn ports(&self) -> Result<Vec<PortInfo>, DeviceError>;

    /// Cameras currently connected, in detection order.
    fn detect(&self, ctx: &Context) -> Result<Vec<DetectedCamera>, DeviceError>;

    /// Open a camera of the given model on the given port.
    ///
    /// `port` is `None` for models that need no port (Directory Browse).
    fn open(
        &self,
        abilities: &Abilities,
        port: Option<&PortInfo>,
        ctx: &Context,
    ) -> Result<Box<dyn Camera>, DeviceError>;
}

/// Operations on a bound camera.
///
/// Every long-running call receives the execution context so it can report
/// progress and poll for cancellation between internal steps.
pub trait Camera: Send {
    /// Set the serial transfer speed. Only valid on serial ports.
    fn set_port_speed(&mut self, _speed: u32) -> Result<(), DeviceError> {
        Err(DeviceError::NotSupported)
    }

    /// Install callbacks for camera status and camera message text.
    fn set_sinks(&mut self, status: Sink, message: Sink);

    fn list_folders(&mut self, folder: &str, ctx: &Context) -> Result<Vec<String>, DeviceError>;

    fn list_files(&mut self, folder: &str, ctx: &Context) -> Result<Vec<String>, DeviceError>;

    fn get_file(
        &mut self,
        folder: &str,
        name: &str,
        kind: FileKind,
        ctx: &Context,
    ) -> Result<CameraFile, DeviceError>;

    fn delete_file(&mut self, folder: &str, name: &str, ctx: &Context)
        -> Result<(), DeviceError>;

    fn delete_all(&mut self, folder: &str, ctx: &Context) -> Result<(), DeviceError>;

    fn put_file(
        &mut self,
        folder: &str,
        file: &CameraFile,
        ctx: &Context,
    ) -> Result<(), DeviceError>;

    fn make_dir(&mut self, folder: &str, name: &str, ctx: &Context) -> Result<(), DeviceError>;

    fn remove_dir(&mut self, folder: &str, name: &str, ctx: &Context)
        -> Result<(), DeviceError>;

    /// Trigger a capture and return where the new file landed on the camera.
    fn capture(&mut self, _kind: CaptureKind, _ctx: &Context) -> Result<CameraFilePath, DeviceError> {
        Err(DeviceError::NotSupported)
    }

    /// Capture a quick preview without storing it on the camera.
    fn capture_preview(&mut self, _ctx: &Context) -> Result<CameraFile, DeviceError> {
        Err(DeviceError::NotSupported)
    }

    fn summary(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Err(DeviceError::NotSupported)
    }

    fn manual(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Err(DeviceError::NotSupported)
    }

    fn about(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Err(DeviceError::NotSupported)
    }

    /// Close the connection. Called exactly once when the binding is released.
    fn exit(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}
