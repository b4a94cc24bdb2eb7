//! Data types exchanged with camera drivers.

use std::fmt;

/// Name of the pseudo-model that browses a local directory instead of a
/// real camera. Port resolution is skipped for it.
pub const DIRECTORY_BROWSE: &str = "Directory Browse";

/// Driver maturity as reported in the model catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverStatus {
    #[default]
    Production,
    Testing,
    Experimental,
}

/// Class of a port, derived from the scheme of its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortType {
    Serial,
    Usb,
    Disk,
    Unknown,
}

impl PortType {
    /// Classify a port path by its scheme prefix (`serial:`, `usb:`, `disk:`).
    pub fn from_path(path: &str) -> Self {
        match path.split_once(':').map(|(scheme, _)| scheme) {
            Some("serial") => PortType::Serial,
            Some("usb") => PortType::Usb,
            Some("disk") => PortType::Disk,
            _ => PortType::Unknown,
        }
    }
}

/// One entry of the port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Full port path including scheme, e.g. `serial:/dev/ttyS0`
    pub path: String,
    /// Human-readable description
    pub name: String,
}

impl PortInfo {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn port_type(&self) -> PortType {
        PortType::from_path(&self.path)
    }
}

/// Port classes a model can be connected through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortSupport {
    pub serial: bool,
    pub usb: bool,
}

/// Capture operations a model supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSupport {
    pub image: bool,
    pub video: bool,
    pub audio: bool,
    pub preview: bool,
    pub config: bool,
}

/// Capability descriptor for one camera model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abilities {
    pub model: String,
    pub status: DriverStatus,
    pub ports: PortSupport,
    /// Supported serial speeds, empty when the model has no serial support
    pub speeds: Vec<u32>,
    pub capture: CaptureSupport,
    pub delete: bool,
    pub preview: bool,
    pub upload: bool,
    pub usb_vendor: u16,
    pub usb_product: u16,
}

impl Abilities {
    /// Minimal descriptor with only the model name set.
    pub fn named(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

/// A camera found by auto-detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCamera {
    pub model: String,
    pub port: String,
}

/// Which representation of a remote file to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Normal,
    Preview,
    Raw,
    Audio,
}

impl FileKind {
    /// Filename prefix that distinguishes this kind from normal images.
    pub fn prefix(&self) -> &'static str {
        match self {
            FileKind::Normal => "",
            FileKind::Preview => "thumb_",
            FileKind::Raw => "raw_",
            FileKind::Audio => "audio_",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Normal => "file",
            FileKind::Preview => "thumbnail",
            FileKind::Raw => "raw data",
            FileKind::Audio => "audio data",
        };
        f.write_str(name)
    }
}

/// What a capture operation should record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Image,
    Movie,
    Sound,
}

/// A file transferred from or to the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl CameraFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a local file, naming it after the last path component.
    pub fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, data })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Location of a file on the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFilePath {
    pub folder: String,
    pub name: String,
}

impl fmt::Display for CameraFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", join_folder(&self.folder, &self.name))
    }
}

/// Join a remote folder and a child name with exactly one `/`.
pub fn join_folder(folder: &str, name: &str) -> String {
    if folder.ends_with('/') {
        format!("{}{}", folder, name)
    } else {
        format!("{}/{}", folder, name)
    }
}
