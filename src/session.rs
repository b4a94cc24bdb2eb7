//! Session state shared by every option handler.
//!
//! A [`Session`] is created once per process. Handlers receive it `&mut`
//! in dispatch order and mutate [`SessionState`]; the first handler that
//! needs the device triggers target resolution, whose result is kept for
//! the rest of the process.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};

use crate::context::Context;
use crate::device::{Camera, CameraFile, CameraFilePath, CaptureKind, DeviceError, Driver, FileKind};
use crate::error::CliError;
use crate::settings::SettingsStore;
use crate::target::{self, DeviceBinding, TargetRequest};
use crate::terminal::Terminal;

/// Slot holding the bound camera. Emptied when the camera is released.
pub type CameraSlot = Arc<Mutex<Option<Box<dyn Camera>>>>;

/// How long a release waits for a running driver call to return the
/// camera. Drivers poll the cancel flag between chunks, so after an
/// interrupt this is normally a single chunk.
const RELEASE_WAIT: Duration = Duration::from_secs(2);
const RELEASE_POLL: Duration = Duration::from_millis(10);

/// Mutable settings collected from the config file and from flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub model: Option<String>,
    pub port: Option<String>,
    pub speed: Option<u32>,
    pub quiet: bool,
    pub debug: bool,
    /// Current remote folder
    pub folder: String,
    /// Whether "all" operations and listings descend into subfolders
    pub recurse: bool,
    /// Output filename template, used when `filename_override` is set
    pub filename: String,
    pub filename_override: bool,
    /// Next value substituted for `%d` in the filename template
    pub counter: u32,
    /// Write fetched files to stdout instead of disk
    pub stdout: bool,
    /// Prefix stdout data with its size
    pub stdout_size: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            model: None,
            port: None,
            speed: None,
            quiet: false,
            debug: false,
            folder: "/".to_string(),
            recurse: true,
            filename: String::new(),
            filename_override: false,
            counter: 1,
            stdout: false,
            stdout_size: false,
        }
    }
}

impl SessionState {
    pub fn target_request(&self) -> TargetRequest {
        TargetRequest {
            model: self.model.clone(),
            port: self.port.clone(),
            speed: self.speed,
            quiet: self.quiet,
        }
    }
}

/// Handle that releases the bound camera and the context at most once.
///
/// Cloned into the interrupt handler so an abort can release from the
/// handler thread.
#[derive(Clone)]
pub struct ReleaseHandle {
    camera: CameraSlot,
    context: Arc<Context>,
    released: Arc<AtomicBool>,
}

impl ReleaseHandle {
    /// Release the camera and close the context.
    ///
    /// Returns `false` if a release already happened, or if a running
    /// driver call kept the camera past the wait.
    pub fn release(&self) -> bool {
        self.release_within(RELEASE_WAIT)
    }

    /// [`release`](Self::release) with an explicit wait for a busy camera.
    ///
    /// The released flag is only set once the camera slot is held, so a
    /// release that timed out can be retried.
    pub fn release_within(&self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        let mut slot = loop {
            match self.camera.try_lock() {
                Ok(slot) => break slot,
                Err(TryLockError::Poisoned(poisoned)) => break poisoned.into_inner(),
                Err(TryLockError::WouldBlock) if Instant::now() < deadline => {
                    std::thread::sleep(RELEASE_POLL);
                }
                Err(TryLockError::WouldBlock) => {
                    log::warn!("Camera still busy after {:?}, not releasing it", wait);
                    return false;
                }
            }
        };

        // Set under the slot lock so a concurrent bind or release sees it.
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        let taken = slot.take();
        drop(slot);

        if let Some(mut camera) = taken {
            log::debug!("Releasing camera");
            if let Err(e) = camera.exit() {
                log::warn!("Could not close camera: {}", e);
            }
        }

        self.context.close();
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }
}

/// Everything a handler can touch.
pub struct Session {
    pub state: SessionState,
    binding: Option<DeviceBinding>,
    driver: Box<dyn Driver>,
    settings: Box<dyn SettingsStore>,
    terminal: Terminal,
    release: ReleaseHandle,
}

impl Session {
    pub fn new(
        state: SessionState,
        driver: Box<dyn Driver>,
        settings: Box<dyn SettingsStore>,
        context: Arc<Context>,
        terminal: Terminal,
    ) -> Self {
        context.set_quiet(state.quiet);
        Self {
            state,
            binding: None,
            driver,
            settings,
            terminal,
            release: ReleaseHandle {
                camera: Arc::new(Mutex::new(None)),
                context,
                released: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn set_quiet(&mut self, quiet: bool) {
        self.state.quiet = quiet;
        self.release.context.set_quiet(quiet);
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.release.context
    }

    pub fn terminal(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    /// Output stream for command results.
    pub fn out(&mut self) -> &mut dyn Write {
        self.terminal.out()
    }

    /// The resolved binding, if resolution has happened.
    pub fn binding(&self) -> Option<&DeviceBinding> {
        self.binding.as_ref()
    }

    /// Resolve the target on first use and return the binding.
    ///
    /// Later calls return the same binding even if the model or port in
    /// [`SessionState`] changed since.
    pub fn bind(&mut self) -> Result<&DeviceBinding, CliError> {
        if self.release.is_released() {
            return Err(CliError::DeviceReleased);
        }
        if self.binding.is_none() {
            let request = self.state.target_request();
            let (binding, mut camera) = target::resolve(
                self.driver.as_ref(),
                &request,
                self.settings.as_mut(),
                &self.release.context,
            )?;
            match self.release.camera.lock() {
                Ok(mut slot) if !self.release.is_released() => *slot = Some(camera),
                _ => {
                    // Released while opening; close what was just opened.
                    if let Err(e) = camera.exit() {
                        log::warn!("Could not close camera: {}", e);
                    }
                    return Err(CliError::DeviceReleased);
                }
            }
            self.binding = Some(binding);
        }
        self.binding.as_ref().ok_or(CliError::DeviceReleased)
    }

    /// Bind if needed and hand out the device for a handler.
    ///
    /// The camera itself is locked per driver call, so an abort can take
    /// it between two calls of a running handler.
    pub fn device(&mut self) -> Result<Device<'_>, CliError> {
        self.bind()?;
        Ok(Device {
            camera: self.release.camera.as_ref(),
            ctx: &self.release.context,
            terminal: &mut self.terminal,
            state: &mut self.state,
        })
    }

    /// Handle used by the interrupt handler and at exit.
    pub fn release_handle(&self) -> ReleaseHandle {
        self.release.clone()
    }

    /// Release the camera and context. Only the first call has an effect.
    pub fn release(&self) -> bool {
        self.release.release()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release.release();
    }
}

/// The bound camera together with the session parts handlers need while
/// talking to it.
pub struct Device<'a> {
    camera: &'a Mutex<Option<Box<dyn Camera>>>,
    pub ctx: &'a Context,
    pub terminal: &'a mut Terminal,
    pub state: &'a mut SessionState,
}

impl Device<'_> {
    /// Run one driver call with the camera locked for its duration.
    fn with_camera<T, F>(&self, call: F) -> Result<T, CliError>
    where
        F: FnOnce(&mut dyn Camera, &Context) -> Result<T, DeviceError>,
    {
        let mut slot = self.camera.lock().map_err(|_| CliError::DeviceReleased)?;
        let camera = slot.as_mut().ok_or(CliError::DeviceReleased)?;
        Ok(call(camera.as_mut(), self.ctx)?)
    }

    pub fn list_folders(&mut self, folder: &str) -> Result<Vec<String>, CliError> {
        self.with_camera(|camera, ctx| camera.list_folders(folder, ctx))
    }

    pub fn list_files(&mut self, folder: &str) -> Result<Vec<String>, CliError> {
        self.with_camera(|camera, ctx| camera.list_files(folder, ctx))
    }

    pub fn get_file(&mut self, folder: &str, name: &str, kind: FileKind) -> Result<CameraFile, CliError> {
        self.with_camera(|camera, ctx| camera.get_file(folder, name, kind, ctx))
    }

    pub fn delete_file(&mut self, folder: &str, name: &str) -> Result<(), CliError> {
        self.with_camera(|camera, ctx| camera.delete_file(folder, name, ctx))
    }

    pub fn delete_all(&mut self, folder: &str) -> Result<(), CliError> {
        self.with_camera(|camera, ctx| camera.delete_all(folder, ctx))
    }

    pub fn put_file(&mut self, folder: &str, file: &CameraFile) -> Result<(), CliError> {
        self.with_camera(|camera, ctx| camera.put_file(folder, file, ctx))
    }

    pub fn make_dir(&mut self, folder: &str, name: &str) -> Result<(), CliError> {
        self.with_camera(|camera, ctx| camera.make_dir(folder, name, ctx))
    }

    pub fn remove_dir(&mut self, folder: &str, name: &str) -> Result<(), CliError> {
        self.with_camera(|camera, ctx| camera.remove_dir(folder, name, ctx))
    }

    pub fn capture(&mut self, kind: CaptureKind) -> Result<CameraFilePath, CliError> {
        self.with_camera(|camera, ctx| camera.capture(kind, ctx))
    }

    pub fn capture_preview(&mut self) -> Result<CameraFile, CliError> {
        self.with_camera(|camera, ctx| camera.capture_preview(ctx))
    }

    pub fn summary(&mut self) -> Result<String, CliError> {
        self.with_camera(|camera, ctx| camera.summary(ctx))
    }

    pub fn manual(&mut self) -> Result<String, CliError> {
        self.with_camera(|camera, ctx| camera.manual(ctx))
    }

    pub fn about(&mut self) -> Result<String, CliError> {
        self.with_camera(|camera, ctx| camera.about(ctx))
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.terminal.out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::device::{Abilities, MemoryDriver, PortInfo};
    use crate::settings::MemorySettings;
    use crate::terminal::SharedBuffer;

    fn session(driver: MemoryDriver) -> Session {
        let state = SessionState {
            model: Some("ModelX".to_string()),
            port: Some("usb:".to_string()),
            ..SessionState::default()
        };
        let context = Arc::new(Context::with_writer(
            CancelToken::new(),
            Box::new(SharedBuffer::new()),
        ));
        let terminal = Terminal::new(Box::new(SharedBuffer::new()), Box::new(std::io::empty()));
        Session::new(state, Box::new(driver), Box::new(MemorySettings::new()), context, terminal)
    }

    fn driver() -> MemoryDriver {
        MemoryDriver::new()
            .with_model(Abilities::named("ModelX"))
            .with_model(Abilities::named("ModelY"))
            .with_port(PortInfo::new("usb:", "Universal Serial Bus"))
    }

    #[test]
    fn test_defaults() {
        let state = SessionState::default();
        assert_eq!(state.folder, "/");
        assert!(state.recurse);
        assert_eq!(state.counter, 1);
        assert!(!state.filename_override);
    }

    #[test]
    fn test_binding_is_resolved_once() {
        let driver = driver();
        let shared = driver.state();
        let mut session = session(driver);

        assert_eq!(session.bind().unwrap().model(), "ModelX");
        session.state.model = Some("ModelY".to_string());
        assert_eq!(session.bind().unwrap().model(), "ModelX");
        assert_eq!(shared.lock().unwrap().opened, 1);
    }

    #[test]
    fn test_release_happens_once() {
        let driver = driver();
        let shared = driver.state();
        let mut session = session(driver);
        session.bind().unwrap();

        let handle = session.release_handle();
        assert!(handle.release());
        assert!(!session.release());
        drop(session);
        assert_eq!(shared.lock().unwrap().released, 1);
        assert!(handle.context().is_closed());
    }

    #[test]
    fn test_device_after_release_fails() {
        let mut session = session(driver());
        session.bind().unwrap();
        session.release();
        assert!(matches!(session.device(), Err(CliError::DeviceReleased)));
    }

    #[test]
    fn test_device_does_not_hold_camera_between_calls() {
        let driver = driver();
        let shared = driver.state();
        let mut session = session(driver);
        let handle = session.release_handle();
        let mut dev = session.device().unwrap();

        dev.list_files("/").unwrap();
        assert!(handle.release_within(Duration::ZERO));
        assert!(matches!(dev.list_files("/"), Err(CliError::DeviceReleased)));
        drop(dev);
        assert_eq!(shared.lock().unwrap().released, 1);
    }

    #[test]
    fn test_release_waits_for_running_call() {
        let driver = driver();
        let shared = driver.state();
        let mut session = session(driver);
        session.bind().unwrap();
        let handle = session.release_handle();

        let slot = Arc::clone(&handle.camera);
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let worker = std::thread::spawn(move || {
            let _guard = slot.lock().unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(50));
        });
        locked_rx.recv().unwrap();

        assert!(handle.release());
        worker.join().unwrap();
        assert_eq!(shared.lock().unwrap().released, 1);
    }

    #[test]
    fn test_busy_camera_release_can_be_retried() {
        let driver = driver();
        let shared = driver.state();
        let mut session = session(driver);
        session.bind().unwrap();
        let handle = session.release_handle();

        let guard = handle.camera.lock().unwrap();
        assert!(!handle.release_within(Duration::from_millis(20)));
        assert!(!handle.is_released());
        assert!(!handle.context().is_closed());
        drop(guard);

        drop(session);
        assert!(handle.is_released());
        assert_eq!(shared.lock().unwrap().released, 1);
    }

    #[test]
    fn test_unbound_session_releases_nothing() {
        let driver = driver();
        let shared = driver.state();
        let session = session(driver);
        drop(session);
        assert_eq!(shared.lock().unwrap().released, 0);
        assert_eq!(shared.lock().unwrap().opened, 0);
    }
}
