//! Listing, fetching, deleting and uploading files in the current folder.

use std::io::Write;
use std::path::Path;

use super::required;
use crate::device::{join_folder, CameraFile, FileKind};
use crate::error::CliError;
use crate::foreach::{for_all_files, for_each_in_range, for_each_subfolder};
use crate::options::Flow;
use crate::output::save_remote_file;
use crate::session::{Device, Session};

pub fn list_folders(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    let recurse = dev.state.recurse;
    let quiet = dev.state.quiet;

    if !quiet {
        writeln!(dev.out(), "Folders in folder '{}':", folder)?;
    }
    for_each_subfolder(&mut dev, &folder, recurse, &mut |dev, path| {
        if quiet {
            writeln!(dev.out(), "{}", path)?;
        } else {
            writeln!(dev.out(), " - {}", path)?;
        }
        Ok(())
    })?;
    Ok(Flow::Continue)
}

/// List the files of the current folder, then of every subfolder when
/// recursion is on. Quiet mode prints one remote path per line.
pub fn list_files(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    let recurse = dev.state.recurse;

    print_files(&mut dev, &folder)?;
    if recurse {
        for_each_subfolder(&mut dev, &folder, true, &mut |dev, path| {
            print_files(dev, path)
        })?;
    }
    Ok(Flow::Continue)
}

fn print_files(dev: &mut Device<'_>, folder: &str) -> Result<(), CliError> {
    let files = dev.list_files(folder)?;
    let quiet = dev.state.quiet;
    let out = dev.out();

    if quiet {
        for name in &files {
            writeln!(out, "{}", join_folder(folder, name))?;
        }
        return Ok(());
    }

    match files.len() {
        0 => writeln!(out, "There are no files in folder '{}'.", folder)?,
        1 => writeln!(out, "There is one file in folder '{}':", folder)?,
        n => writeln!(out, "There are {} files in folder '{}':", n, folder)?,
    }
    for (i, name) in files.iter().enumerate() {
        writeln!(out, "#{:<5} {}", i + 1, name)?;
    }
    Ok(())
}

pub fn num_images(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Counting pictures");
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    let count = dev.list_files(&folder)?.len();

    if dev.state.quiet {
        writeln!(dev.out(), "{}", count)?;
    } else {
        writeln!(dev.out(), "Number of pictures in folder {}: {}", folder, count)?;
    }
    Ok(Flow::Continue)
}

pub fn make_dir(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let name = required(arg, "mkdir")?;
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    dev.make_dir(&folder, name)?;
    Ok(Flow::Continue)
}

pub fn remove_dir(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let name = required(arg, "rmdir")?;
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    dev.remove_dir(&folder, name)?;
    Ok(Flow::Continue)
}

/// Fetch one remote file and hand it to the output resolver.
fn fetch(dev: &mut Device<'_>, folder: &str, name: &str, kind: FileKind) -> Result<(), CliError> {
    let file = dev.get_file(folder, name, kind)?;
    save_remote_file(dev.terminal, dev.state, &file, kind)?;
    Ok(())
}

fn fetch_range(session: &mut Session, arg: &str, kind: FileKind) -> Result<Flow, CliError> {
    log::debug!("Getting {} {}", kind, arg);
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    for_each_in_range(&mut dev, &folder, arg, &mut |dev, folder, name| {
        fetch(dev, folder, name, kind)
    })?;
    Ok(Flow::Continue)
}

fn fetch_all(session: &mut Session, kind: FileKind) -> Result<Flow, CliError> {
    log::debug!("Getting every {}", kind);
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    let recurse = dev.state.recurse;
    for_all_files(&mut dev, &folder, recurse, &mut |dev, folder, name| {
        fetch(dev, folder, name, kind)
    })?;
    Ok(Flow::Continue)
}

pub fn get_image(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_range(session, required(arg, "get-image")?, FileKind::Normal)
}

pub fn get_all_images(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_all(session, FileKind::Normal)
}

pub fn get_thumbnail(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_range(session, required(arg, "get-thumbnail")?, FileKind::Preview)
}

pub fn get_all_thumbnails(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_all(session, FileKind::Preview)
}

pub fn get_raw_data(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_range(session, required(arg, "get-raw-data")?, FileKind::Raw)
}

pub fn get_all_raw_data(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_all(session, FileKind::Raw)
}

pub fn get_audio_data(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_range(session, required(arg, "get-audio-data")?, FileKind::Audio)
}

pub fn get_all_audio_data(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    fetch_all(session, FileKind::Audio)
}

pub fn delete_picture(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let range = required(arg, "delete-picture")?;
    log::debug!("Deleting picture(s) {}", range);
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    for_each_in_range(&mut dev, &folder, range, &mut |dev, folder, name| {
        dev.delete_file(folder, name)
    })?;
    Ok(Flow::Continue)
}

/// Delete every file in the current folder. Subfolders are left alone.
pub fn delete_all_images(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Deleting all pictures");
    let mut dev = session.device()?;
    let folder = dev.state.folder.clone();
    dev.delete_all(&folder)?;
    Ok(Flow::Continue)
}

pub fn upload_image(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let path = required(arg, "upload-image")?;
    log::debug!("Uploading picture");
    let mut dev = session.device()?;
    let file = CameraFile::open(Path::new(path))?;
    let folder = dev.state.folder.clone();
    dev.put_file(&folder, &file)?;
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CancelToken, Context};
    use crate::device::{Abilities, MemoryDriver, MemoryState, PortInfo};
    use crate::session::SessionState;
    use crate::settings::MemorySettings;
    use crate::terminal::{SharedBuffer, Terminal};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        session: Session,
        out: SharedBuffer,
        device: Arc<Mutex<MemoryState>>,
        dir: TempDir,
    }

    fn fixture(driver: MemoryDriver, quiet: bool) -> Fixture {
        let driver = driver
            .with_model(Abilities::named("ModelX"))
            .with_port(PortInfo::new("usb:", "Universal Serial Bus"));
        let device = driver.state();
        let dir = TempDir::new().unwrap();
        let out = SharedBuffer::new();
        let context = Arc::new(Context::with_writer(CancelToken::new(), Box::new(SharedBuffer::new())));
        let terminal = Terminal::new(Box::new(out.clone()), Box::new(std::io::empty()));
        let state = SessionState {
            model: Some("ModelX".to_string()),
            port: Some("usb:".to_string()),
            quiet,
            ..SessionState::default()
        };
        let session = Session::new(state, Box::new(driver), Box::new(MemorySettings::new()), context, terminal);
        Fixture { session, out, device, dir }
    }

    fn six_files() -> MemoryDriver {
        (1..=6).fold(MemoryDriver::new(), |d, i| {
            d.with_file("/store", &format!("IMG_{:04}.JPG", i), format!("data{}", i).as_bytes())
        })
    }

    #[test]
    fn test_list_files_quiet_has_no_header() {
        let mut f = fixture(six_files().with_file("/store/sub", "deep.jpg", b"x"), true);
        f.session.state.folder = "/store".to_string();
        list_files(&mut f.session, None).unwrap();

        let text = f.out.contents();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "/store/IMG_0001.JPG");
        assert_eq!(lines[6], "/store/sub/deep.jpg");
    }

    #[test]
    fn test_list_files_without_recursion() {
        let mut f = fixture(six_files().with_file("/store/sub", "deep.jpg", b"x"), false);
        f.session.state.folder = "/store".to_string();
        f.session.state.recurse = false;
        list_files(&mut f.session, None).unwrap();

        let text = f.out.contents();
        assert!(text.starts_with("There are 6 files in folder '/store':\n#1     IMG_0001.JPG\n"));
        assert!(!text.contains("deep.jpg"));
    }

    #[test]
    fn test_list_folders_depth_first() {
        let driver = MemoryDriver::new().with_folder("/a/b").with_folder("/c");
        let mut f = fixture(driver, true);
        list_folders(&mut f.session, None).unwrap();
        assert_eq!(f.out.contents(), "/a\n/a/b\n/c\n");
    }

    #[test]
    fn test_num_images() {
        let mut f = fixture(six_files(), false);
        f.session.state.folder = "/store".to_string();
        num_images(&mut f.session, None).unwrap();
        assert_eq!(f.out.contents(), "Number of pictures in folder /store: 6\n");
    }

    #[test]
    fn test_get_thumbnail_range_uses_prefix() {
        let mut f = fixture(six_files(), true);
        f.session.state.folder = "/store".to_string();
        f.session.state.filename = format!("{}/%d.jpg", f.dir.path().display());
        f.session.state.filename_override = true;

        get_thumbnail(&mut f.session, Some("5-")).unwrap();
        assert!(f.dir.path().join("thumb_1.jpg").exists());
        assert!(f.dir.path().join("thumb_2.jpg").exists());
        assert_eq!(f.session.state.counter, 3);

        let device = f.device.lock().unwrap();
        assert_eq!(device.fetched[0], ("/store/IMG_0005.JPG".to_string(), FileKind::Preview));
    }

    #[test]
    fn test_delete_range_uses_snapshot() {
        let mut f = fixture(six_files(), true);
        f.session.state.folder = "/store".to_string();
        delete_picture(&mut f.session, Some("1,2")).unwrap();

        let device = f.device.lock().unwrap();
        assert_eq!(device.deleted, vec!["/store/IMG_0001.JPG", "/store/IMG_0002.JPG"]);
        assert_eq!(device.files["/store"].len(), 4);
    }

    #[test]
    fn test_delete_by_filename() {
        let mut f = fixture(six_files(), true);
        f.session.state.folder = "/store".to_string();
        delete_picture(&mut f.session, Some("IMG_0004.JPG")).unwrap();
        assert_eq!(f.device.lock().unwrap().deleted, vec!["/store/IMG_0004.JPG"]);
    }

    #[test]
    fn test_bad_range_is_reported() {
        let mut f = fixture(six_files(), true);
        f.session.state.folder = "/store".to_string();
        assert!(matches!(
            get_image(&mut f.session, Some("3-1")),
            Err(CliError::BadRange(_))
        ));
    }

    #[test]
    fn test_delete_all_leaves_subfolders() {
        let mut f = fixture(six_files().with_file("/store/sub", "deep.jpg", b"x"), true);
        f.session.state.folder = "/store".to_string();
        delete_all_images(&mut f.session, None).unwrap();

        let device = f.device.lock().unwrap();
        assert!(device.files["/store"].is_empty());
        assert_eq!(device.files["/store/sub"].len(), 1);
    }

    #[test]
    fn test_upload_and_directories() {
        let mut f = fixture(MemoryDriver::new(), true);
        let local = f.dir.path().join("up.jpg");
        std::fs::write(&local, b"upload").unwrap();

        make_dir(&mut f.session, Some("new")).unwrap();
        f.session.state.folder = "/new".to_string();
        upload_image(&mut f.session, Some(local.to_str().unwrap())).unwrap();
        {
            let device = f.device.lock().unwrap();
            assert_eq!(device.files["/new"][0].name, "up.jpg");
        }

        f.session.state.folder = "/".to_string();
        remove_dir(&mut f.session, Some("new")).unwrap();
        assert!(!f.device.lock().unwrap().folders.contains("/new"));
    }
}
