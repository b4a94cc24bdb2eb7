//! In-memory driver with a scriptable catalog and filesystem.
//!
//! Used by the test suite to exercise target resolution and file
//! operations without hardware. All cameras opened from one driver share
//! the same [`MemoryState`], so tests can inspect what happened after the
//! session has taken ownership of the camera.
//!
//! Test support only. The `camctl` binary never constructs it; it is
//! public so the integration tests under `tests/` can build sessions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    join_folder, Abilities, Camera, CameraFile, CameraFilePath, CaptureKind, DetectedCamera,
    DeviceError, Driver, FileKind, PortInfo, Sink,
};
use crate::context::{Context, Feedback};

/// Observable state of the in-memory device.
#[derive(Debug, Default)]
pub struct MemoryState {
    /// Every folder path, including `/`
    pub folders: BTreeSet<String>,
    /// Files per folder, in listing order
    pub files: BTreeMap<String, Vec<CameraFile>>,
    /// Last speed applied with `set_port_speed`
    pub speed: Option<u32>,
    /// Number of cameras opened
    pub opened: usize,
    /// Number of `exit` calls
    pub released: usize,
    /// `(path, kind)` of every fetched file, in order
    pub fetched: Vec<(String, FileKind)>,
    /// Path of every deleted file, in order
    pub deleted: Vec<String>,
    /// Number of captures taken
    pub captures: usize,
}

impl MemoryState {
    fn folder_files(&mut self, folder: &str) -> Result<&mut Vec<CameraFile>, DeviceError> {
        if !self.folders.contains(folder) {
            return Err(DeviceError::DirectoryNotFound(folder.to_string()));
        }
        Ok(self.files.entry(folder.to_string()).or_default())
    }
}

/// Scriptable driver.
pub struct MemoryDriver {
    catalog: Vec<Abilities>,
    ports: Vec<PortInfo>,
    detected: Vec<DetectedCamera>,
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// Empty catalog, no ports, and a filesystem containing only `/`.
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.folders.insert("/".to_string());
        Self {
            catalog: Vec::new(),
            ports: Vec::new(),
            detected: Vec::new(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_model(mut self, abilities: Abilities) -> Self {
        self.catalog.push(abilities);
        self
    }

    pub fn with_port(mut self, port: PortInfo) -> Self {
        self.ports.push(port);
        self
    }

    /// Add a camera to the auto-detection result.
    pub fn with_detected(mut self, model: &str, port: &str) -> Self {
        self.detected.push(DetectedCamera {
            model: model.to_string(),
            port: port.to_string(),
        });
        self
    }

    /// Create a folder and all of its parents.
    pub fn with_folder(self, path: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let mut current = String::new();
            for part in path.split('/').filter(|p| !p.is_empty()) {
                current.push('/');
                current.push_str(part);
                state.folders.insert(current.clone());
            }
        }
        self
    }

    /// Add a file to `folder`, creating the folder if needed.
    pub fn with_file(self, folder: &str, name: &str, data: &[u8]) -> Self {
        let driver = self.with_folder(folder);
        if let Ok(mut state) = driver.state.lock() {
            state
                .files
                .entry(normalize(folder))
                .or_default()
                .push(CameraFile::new(name, data.to_vec()));
        }
        driver
    }

    /// Shared state handle for inspection.
    pub fn state(&self) -> Arc<Mutex<MemoryState>> {
        Arc::clone(&self.state)
    }
}

impl Driver for MemoryDriver {
    fn abilities(&self, _ctx: &Context) -> Result<Vec<Abilities>, DeviceError> {
        Ok(self.catalog.clone())
    }

    fn ports(&self) -> Result<Vec<PortInfo>, DeviceError> {
        Ok(self.ports.clone())
    }

    fn detect(&self, _ctx: &Context) -> Result<Vec<DetectedCamera>, DeviceError> {
        Ok(self.detected.clone())
    }

    fn open(
        &self,
        abilities: &Abilities,
        _port: Option<&PortInfo>,
        _ctx: &Context,
    ) -> Result<Box<dyn Camera>, DeviceError> {
        lock(&self.state)?.opened += 1;
        Ok(Box::new(MemoryCamera {
            model: abilities.model.clone(),
            state: Arc::clone(&self.state),
            status: None,
            message: None,
        }))
    }
}

/// Camera opened from a [`MemoryDriver`].
pub struct MemoryCamera {
    model: String,
    state: Arc<Mutex<MemoryState>>,
    status: Option<Sink>,
    message: Option<Sink>,
}

impl MemoryCamera {
    fn emit_status(&self, text: &str) {
        if let Some(sink) = &self.status {
            sink(text);
        }
    }
}

impl Camera for MemoryCamera {
    fn set_port_speed(&mut self, speed: u32) -> Result<(), DeviceError> {
        lock(&self.state)?.speed = Some(speed);
        Ok(())
    }

    fn set_sinks(&mut self, status: Sink, message: Sink) {
        self.status = Some(status);
        self.message = Some(message);
    }

    fn list_folders(&mut self, folder: &str, _ctx: &Context) -> Result<Vec<String>, DeviceError> {
        let folder = normalize(folder);
        let state = lock(&self.state)?;
        if !state.folders.contains(&folder) {
            return Err(DeviceError::DirectoryNotFound(folder));
        }
        Ok(state
            .folders
            .iter()
            .filter_map(|path| {
                let (parent, name) = split_parent(path)?;
                (parent == folder).then(|| name.to_string())
            })
            .collect())
    }

    fn list_files(&mut self, folder: &str, _ctx: &Context) -> Result<Vec<String>, DeviceError> {
        let folder = normalize(folder);
        let mut state = lock(&self.state)?;
        Ok(state
            .folder_files(&folder)?
            .iter()
            .map(|f| f.name.clone())
            .collect())
    }

    fn get_file(
        &mut self,
        folder: &str,
        name: &str,
        kind: FileKind,
        ctx: &Context,
    ) -> Result<CameraFile, DeviceError> {
        if ctx.check_cancel() == Feedback::Cancel {
            return Err(DeviceError::Cancelled);
        }

        let folder = normalize(folder);
        let mut state = lock(&self.state)?;
        let file = state
            .folder_files(&folder)?
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .ok_or_else(|| DeviceError::FileNotFound(name.to_string()))?;
        state.fetched.push((join_folder(&folder, name), kind));

        let progress = ctx.progress_start(file.size() as f32, &format!("Downloading '{}'...", name));
        if let Some(id) = progress {
            ctx.progress_update(id, file.size() as f32);
            ctx.progress_stop(id);
        }
        Ok(file)
    }

    fn delete_file(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let folder = normalize(folder);
        let mut state = lock(&self.state)?;
        let files = state.folder_files(&folder)?;
        let index = files
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DeviceError::FileNotFound(name.to_string()))?;
        files.remove(index);
        state.deleted.push(join_folder(&folder, name));
        Ok(())
    }

    fn delete_all(&mut self, folder: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let folder = normalize(folder);
        let mut state = lock(&self.state)?;
        let removed: Vec<String> = state
            .folder_files(&folder)?
            .drain(..)
            .map(|f| join_folder(&folder, &f.name))
            .collect();
        state.deleted.extend(removed);
        Ok(())
    }

    fn put_file(&mut self, folder: &str, file: &CameraFile, _ctx: &Context) -> Result<(), DeviceError> {
        let folder = normalize(folder);
        let mut state = lock(&self.state)?;
        let files = state.folder_files(&folder)?;
        files.retain(|f| f.name != file.name);
        files.push(file.clone());
        Ok(())
    }

    fn make_dir(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let folder = normalize(folder);
        let path = join_folder(&folder, name);
        let mut state = lock(&self.state)?;
        if !state.folders.contains(&folder) {
            return Err(DeviceError::DirectoryNotFound(folder));
        }
        if !state.folders.insert(path.clone()) {
            return Err(DeviceError::DirectoryExists(path));
        }
        Ok(())
    }

    fn remove_dir(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let path = join_folder(&normalize(folder), name);
        let mut state = lock(&self.state)?;
        if !state.folders.remove(&path) {
            return Err(DeviceError::DirectoryNotFound(path));
        }
        state.files.remove(&path);
        Ok(())
    }

    fn capture(&mut self, kind: CaptureKind, _ctx: &Context) -> Result<CameraFilePath, DeviceError> {
        let name = {
            let mut state = lock(&self.state)?;
            state.captures += 1;
            let extension = match kind {
                CaptureKind::Image => "jpg",
                CaptureKind::Movie => "avi",
                CaptureKind::Sound => "wav",
            };
            let name = format!("capt{:04}.{}", state.captures, extension);
            state
                .files
                .entry("/".to_string())
                .or_default()
                .push(CameraFile::new(name.clone(), Vec::new()));
            name
        };
        self.emit_status("Capture done");
        Ok(CameraFilePath {
            folder: "/".to_string(),
            name,
        })
    }

    fn capture_preview(&mut self, _ctx: &Context) -> Result<CameraFile, DeviceError> {
        Ok(CameraFile::new("capture_preview.jpg", b"preview".to_vec()))
    }

    fn summary(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        let state = lock(&self.state)?;
        let files: usize = state.files.values().map(Vec::len).sum();
        Ok(format!("Model: {}\nFiles: {}", self.model, files))
    }

    fn manual(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Ok(format!("{} needs no manual.", self.model))
    }

    fn about(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Ok("In-memory test driver.".to_string())
    }

    fn exit(&mut self) -> Result<(), DeviceError> {
        lock(&self.state)?.released += 1;
        Ok(())
    }
}

fn lock(state: &Mutex<MemoryState>) -> Result<MutexGuard<'_, MemoryState>, DeviceError> {
    state
        .lock()
        .map_err(|_| DeviceError::Transfer("memory state poisoned".to_string()))
}

/// Strip a trailing `/` (except on the root) and ensure a leading one.
fn normalize(folder: &str) -> String {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn split_parent(path: &str) -> Option<(String, &str)> {
    if path == "/" {
        return None;
    }
    let (parent, name) = path.rsplit_once('/')?;
    let parent = if parent.is_empty() { "/" } else { parent };
    Some((parent.to_string(), name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::terminal::SharedBuffer;

    fn ctx() -> Context {
        Context::with_writer(CancelToken::new(), Box::new(SharedBuffer::new()))
    }

    fn camera(driver: &MemoryDriver) -> Box<dyn Camera> {
        driver.open(&Abilities::named("ModelX"), None, &ctx()).unwrap()
    }

    #[test]
    fn test_folder_tree() {
        let driver = MemoryDriver::new()
            .with_folder("/store/DCIM/100")
            .with_folder("/store/MISC");
        let mut cam = camera(&driver);
        let ctx = ctx();
        assert_eq!(cam.list_folders("/", &ctx).unwrap(), vec!["store"]);
        assert_eq!(cam.list_folders("/store", &ctx).unwrap(), vec!["DCIM", "MISC"]);
        assert_eq!(cam.list_folders("/store/DCIM/", &ctx).unwrap(), vec!["100"]);
        assert!(matches!(
            cam.list_folders("/nope", &ctx),
            Err(DeviceError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_files_keep_insertion_order() {
        let driver = MemoryDriver::new()
            .with_file("/store", "b.jpg", b"b")
            .with_file("/store", "a.jpg", b"a");
        let mut cam = camera(&driver);
        assert_eq!(cam.list_files("/store", &ctx()).unwrap(), vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_get_file_honours_cancel() {
        let driver = MemoryDriver::new().with_file("/", "a.jpg", b"a");
        let mut cam = camera(&driver);
        let token = CancelToken::new();
        let ctx = Context::with_writer(token.clone(), Box::new(SharedBuffer::new()));
        assert!(cam.get_file("/", "a.jpg", FileKind::Normal, &ctx).is_ok());
        token.interrupt();
        assert!(matches!(
            cam.get_file("/", "a.jpg", FileKind::Normal, &ctx),
            Err(DeviceError::Cancelled)
        ));
    }

    #[test]
    fn test_make_and_remove_dir() {
        let driver = MemoryDriver::new();
        let mut cam = camera(&driver);
        let ctx = ctx();
        cam.make_dir("/", "new", &ctx).unwrap();
        assert!(matches!(cam.make_dir("/", "new", &ctx), Err(DeviceError::DirectoryExists(_))));
        cam.remove_dir("/", "new", &ctx).unwrap();
        assert!(cam.list_folders("/", &ctx).unwrap().is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/store/"), "/store");
        assert_eq!(normalize("store"), "/store");
    }
}
