//! The "Directory Browse" driver.
//!
//! Presents a local directory tree as the camera's remote filesystem.
//! Remote paths are always absolute (`/`, `/DCIM/100`) and are resolved
//! below the configured root; `..` and `.` components are rejected.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use super::{
    Abilities, Camera, CameraFile, DetectedCamera, DeviceError, Driver, DriverStatus, FileKind,
    PortInfo, PortSupport, Sink, DIRECTORY_BROWSE,
};
use crate::context::{Context, Feedback};

/// Bytes read between two progress updates and cancellation polls.
const CHUNK_SIZE: usize = 64 * 1024;

/// Driver whose only model is Directory Browse over `root`.
pub struct DirectoryDriver {
    root: PathBuf,
}

impl DirectoryDriver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abilities_entry() -> Abilities {
        Abilities {
            model: DIRECTORY_BROWSE.to_string(),
            status: DriverStatus::Production,
            ports: PortSupport::default(),
            delete: true,
            upload: true,
            ..Abilities::default()
        }
    }
}

impl Driver for DirectoryDriver {
    fn abilities(&self, _ctx: &Context) -> Result<Vec<Abilities>, DeviceError> {
        Ok(vec![Self::abilities_entry()])
    }

    fn ports(&self) -> Result<Vec<PortInfo>, DeviceError> {
        let mut ports = vec![PortInfo::new("usb:", "Universal Serial Bus")];

        // Serial devices are listed but no model in this catalog uses them.
        if let Ok(entries) = fs::read_dir("/dev") {
            let mut serial: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with("ttyS") || name.starts_with("ttyUSB"))
                .collect();
            serial.sort();
            ports.extend(serial.into_iter().map(|name| {
                PortInfo::new(format!("serial:/dev/{}", name), format!("Serial Port {}", name))
            }));
        }

        ports.push(PortInfo::new(
            format!("disk:{}", self.root.display()),
            "Media at local directory",
        ));
        Ok(ports)
    }

    fn detect(&self, _ctx: &Context) -> Result<Vec<DetectedCamera>, DeviceError> {
        if self.root.is_dir() {
            Ok(vec![DetectedCamera {
                model: DIRECTORY_BROWSE.to_string(),
                port: format!("disk:{}", self.root.display()),
            }])
        } else {
            log::debug!("Browse root {} is not a directory", self.root.display());
            Ok(Vec::new())
        }
    }

    fn open(
        &self,
        abilities: &Abilities,
        _port: Option<&PortInfo>,
        _ctx: &Context,
    ) -> Result<Box<dyn Camera>, DeviceError> {
        if abilities.model != DIRECTORY_BROWSE {
            return Err(DeviceError::BadParameters(format!(
                "model '{}' is not handled by this driver",
                abilities.model
            )));
        }
        if !self.root.is_dir() {
            return Err(DeviceError::DirectoryNotFound(self.root.display().to_string()));
        }
        log::debug!("Browsing {}", self.root.display());
        Ok(Box::new(DirectoryCamera {
            root: self.root.clone(),
            status: None,
            message: None,
        }))
    }
}

/// Camera bound to a local directory.
pub struct DirectoryCamera {
    root: PathBuf,
    status: Option<Sink>,
    message: Option<Sink>,
}

impl DirectoryCamera {
    /// Map a remote folder (and optional child) to a local path.
    fn local(&self, folder: &str, name: Option<&str>) -> Result<PathBuf, DeviceError> {
        let mut path = self.root.clone();
        let remote = match name {
            Some(name) => super::join_folder(folder, name),
            None => folder.to_string(),
        };
        for component in Path::new(&remote).components() {
            match component {
                Component::RootDir => {}
                Component::Normal(part) => path.push(part),
                _ => {
                    return Err(DeviceError::BadParameters(format!(
                        "invalid remote path '{}'",
                        remote
                    )))
                }
            }
        }
        Ok(path)
    }

    fn existing_dir(&self, folder: &str) -> Result<PathBuf, DeviceError> {
        let path = self.local(folder, None)?;
        if !path.is_dir() {
            return Err(DeviceError::DirectoryNotFound(folder.to_string()));
        }
        Ok(path)
    }

    fn entries(&self, folder: &str, dirs: bool) -> Result<Vec<String>, DeviceError> {
        let path = self.existing_dir(folder)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() == dirs {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn emit_message(&self, text: &str) {
        if let Some(sink) = &self.message {
            sink(text);
        }
    }

    fn count_files(path: &Path) -> usize {
        let Ok(entries) = fs::read_dir(path) else {
            return 0;
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| {
                let p = e.path();
                if p.is_dir() {
                    Self::count_files(&p)
                } else {
                    1
                }
            })
            .sum()
    }
}

impl Camera for DirectoryCamera {
    fn set_sinks(&mut self, status: Sink, message: Sink) {
        self.status = Some(status);
        self.message = Some(message);
    }

    fn list_folders(&mut self, folder: &str, _ctx: &Context) -> Result<Vec<String>, DeviceError> {
        self.entries(folder, true)
    }

    fn list_files(&mut self, folder: &str, _ctx: &Context) -> Result<Vec<String>, DeviceError> {
        self.entries(folder, false)
    }

    fn get_file(
        &mut self,
        folder: &str,
        name: &str,
        kind: FileKind,
        ctx: &Context,
    ) -> Result<CameraFile, DeviceError> {
        match kind {
            FileKind::Normal | FileKind::Raw => {}
            FileKind::Preview | FileKind::Audio => return Err(DeviceError::NotSupported),
        }

        let path = self.local(folder, Some(name))?;
        if !path.is_file() {
            return Err(DeviceError::FileNotFound(name.to_string()));
        }

        let size = fs::metadata(&path)?.len() as usize;
        let mut reader = fs::File::open(&path)?;
        let mut data = Vec::with_capacity(size);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        let progress = ctx.progress_start(size as f32, &format!("Downloading '{}'...", name));
        let result = loop {
            if ctx.check_cancel() == Feedback::Cancel {
                break Err(DeviceError::Cancelled);
            }
            match reader.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    data.extend_from_slice(&chunk[..n]);
                    if let Some(id) = progress {
                        ctx.progress_update(id, data.len() as f32);
                    }
                }
                Err(e) => break Err(DeviceError::Io(e)),
            }
        };
        if let Some(id) = progress {
            ctx.progress_stop(id);
        }
        result?;

        Ok(CameraFile::new(name, data))
    }

    fn delete_file(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let path = self.local(folder, Some(name))?;
        if !path.is_file() {
            return Err(DeviceError::FileNotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn delete_all(&mut self, folder: &str, ctx: &Context) -> Result<(), DeviceError> {
        for name in self.entries(folder, false)? {
            if ctx.check_cancel() == Feedback::Cancel {
                return Err(DeviceError::Cancelled);
            }
            self.delete_file(folder, &name, ctx)?;
        }
        Ok(())
    }

    fn put_file(&mut self, folder: &str, file: &CameraFile, _ctx: &Context) -> Result<(), DeviceError> {
        let dir = self.existing_dir(folder)?;
        let target = self.local(folder, Some(&file.name))?;
        log::debug!("Writing {} bytes to {}", file.size(), dir.display());
        fs::write(target, &file.data)?;
        Ok(())
    }

    fn make_dir(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        self.existing_dir(folder)?;
        let path = self.local(folder, Some(name))?;
        if path.exists() {
            return Err(DeviceError::DirectoryExists(super::join_folder(folder, name)));
        }
        fs::create_dir(path)?;
        Ok(())
    }

    fn remove_dir(&mut self, folder: &str, name: &str, _ctx: &Context) -> Result<(), DeviceError> {
        let path = self.local(folder, Some(name))?;
        if !path.is_dir() {
            return Err(DeviceError::DirectoryNotFound(super::join_folder(folder, name)));
        }
        fs::remove_dir(path)?;
        Ok(())
    }

    fn summary(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Ok(format!(
            "Directory Browse at {}\nFiles: {}",
            self.root.display(),
            Self::count_files(&self.root)
        ))
    }

    fn manual(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Ok("The Directory Browse \"camera\" lets you index photos on your hard drive.".to_string())
    }

    fn about(&mut self, _ctx: &Context) -> Result<String, DeviceError> {
        Ok("Directory Browse driver.\nPresents a local directory as camera storage.".to_string())
    }

    fn exit(&mut self) -> Result<(), DeviceError> {
        self.emit_message(&format!("Closed {}", self.root.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CancelToken;
    use crate::terminal::SharedBuffer;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context::with_writer(CancelToken::new(), Box::new(SharedBuffer::new()))
    }

    fn camera(dir: &TempDir) -> Box<dyn Camera> {
        let driver = DirectoryDriver::new(dir.path());
        let catalog = driver.abilities(&ctx()).unwrap();
        driver.open(&catalog[0], None, &ctx()).unwrap()
    }

    #[test]
    fn test_catalog_has_single_browse_model() {
        let dir = TempDir::new().unwrap();
        let driver = DirectoryDriver::new(dir.path());
        let catalog = driver.abilities(&ctx()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].model, DIRECTORY_BROWSE);
        assert_eq!(driver.detect(&ctx()).unwrap()[0].model, DIRECTORY_BROWSE);
    }

    #[test]
    fn test_ports_include_usb_and_disk() {
        let dir = TempDir::new().unwrap();
        let ports = DirectoryDriver::new(dir.path()).ports().unwrap();
        assert_eq!(ports[0].path, "usb:");
        assert!(ports.last().unwrap().path.starts_with("disk:"));
    }

    #[test]
    fn test_listing_is_sorted_and_split() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("DCIM")).unwrap();
        fs::write(dir.path().join("b.jpg"), b"b").unwrap();
        fs::write(dir.path().join("a.jpg"), b"a").unwrap();

        let mut cam = camera(&dir);
        assert_eq!(cam.list_folders("/", &ctx()).unwrap(), vec!["DCIM"]);
        assert_eq!(cam.list_files("/", &ctx()).unwrap(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_get_file_reports_progress() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), vec![7u8; CHUNK_SIZE + 10]).unwrap();

        let buffer = SharedBuffer::new();
        let ctx = Context::with_writer(CancelToken::new(), Box::new(buffer.clone()));
        let file = camera(&dir).get_file("/", "a.jpg", FileKind::Normal, &ctx).unwrap();
        assert_eq!(file.size(), CHUNK_SIZE + 10);
        assert!(buffer.contents().contains("Percent completed: 100.0\r"));
        assert_eq!(ctx.active_progress(), 0);
    }

    #[test]
    fn test_get_file_stops_when_cancelled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"data").unwrap();

        let token = CancelToken::new();
        token.interrupt();
        let ctx = Context::with_writer(token, Box::new(SharedBuffer::new()));
        let result = camera(&dir).get_file("/", "a.jpg", FileKind::Normal, &ctx);
        assert!(matches!(result, Err(DeviceError::Cancelled)));
        assert_eq!(ctx.active_progress(), 0);
    }

    #[test]
    fn test_previews_are_unsupported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"data").unwrap();
        let result = camera(&dir).get_file("/", "a.jpg", FileKind::Preview, &ctx());
        assert!(matches!(result, Err(DeviceError::NotSupported)));
    }

    #[test]
    fn test_parent_components_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cam = camera(&dir);
        assert!(matches!(
            cam.list_files("/../etc", &ctx()),
            Err(DeviceError::BadParameters(_))
        ));
    }

    #[test]
    fn test_directory_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut cam = camera(&dir);
        let ctx = ctx();

        cam.make_dir("/", "new", &ctx).unwrap();
        assert!(matches!(cam.make_dir("/", "new", &ctx), Err(DeviceError::DirectoryExists(_))));

        cam.put_file("/new", &CameraFile::new("x.jpg", b"x".to_vec()), &ctx)
            .unwrap();
        assert_eq!(cam.list_files("/new", &ctx).unwrap(), vec!["x.jpg"]);

        cam.delete_all("/new", &ctx).unwrap();
        cam.remove_dir("/", "new", &ctx).unwrap();
        assert!(!dir.path().join("new").exists());
    }
}
