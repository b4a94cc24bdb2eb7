//! The Directory Browse driver driven through the full option pipeline.

use std::fs;
use std::sync::Arc;

use camctl::context::{CancelToken, Context};
use camctl::device::{DirectoryDriver, DIRECTORY_BROWSE};
use camctl::options::default_table;
use camctl::settings::MemorySettings;
use camctl::terminal::{SharedBuffer, Terminal};
use camctl::{CliError, Flow, Session, SessionState};
use tempfile::TempDir;

fn storage() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("DCIM/100")).unwrap();
    fs::write(dir.path().join("DCIM/100/a.jpg"), b"alpha").unwrap();
    fs::write(dir.path().join("DCIM/100/b.jpg"), b"bravo").unwrap();
    fs::write(dir.path().join("DCIM/top.jpg"), b"top").unwrap();
    dir
}

fn session(root: &TempDir) -> (Session, SharedBuffer) {
    let out = SharedBuffer::new();
    let context = Arc::new(Context::with_writer(CancelToken::new(), Box::new(SharedBuffer::new())));
    let terminal = Terminal::new(Box::new(out.clone()), Box::new(std::io::empty()));
    let session = Session::new(
        SessionState::default(),
        Box::new(DirectoryDriver::new(root.path())),
        Box::new(MemorySettings::new()),
        context,
        terminal,
    );
    (session, out)
}

fn run(session: &mut Session, args: &[&str]) -> Result<Flow, CliError> {
    let table = default_table();
    table.verify(args)?;
    table.execute(session, args)
}

#[test]
fn test_browse_is_auto_detected() {
    let root = storage();
    let (mut s, out) = session(&root);
    run(&mut s, &["-q", "-f", "/DCIM", "-L"]).unwrap();

    assert_eq!(s.binding().unwrap().model(), DIRECTORY_BROWSE);
    assert!(s.binding().unwrap().port.is_none());
    assert_eq!(out.contents(), "/DCIM/top.jpg\n/DCIM/100/a.jpg\n/DCIM/100/b.jpg\n");
}

#[test]
fn test_list_folders_verbose() {
    let root = storage();
    let (mut s, out) = session(&root);
    run(&mut s, &["--camera", DIRECTORY_BROWSE, "-l"]).unwrap();
    assert_eq!(out.contents(), "Folders in folder '/':\n - /DCIM\n - /DCIM/100\n");
}

#[test]
fn test_get_all_images_with_filename_template() {
    let root = storage();
    let dest = TempDir::new().unwrap();
    let (mut s, _) = session(&root);
    let template = format!("{}/shot%02d.jpg", dest.path().display());

    run(&mut s, &["-q", "--filename", &template, "-f", "/DCIM", "-P"]).unwrap();

    assert_eq!(fs::read(dest.path().join("shot01.jpg")).unwrap(), b"top");
    assert_eq!(fs::read(dest.path().join("shot02.jpg")).unwrap(), b"alpha");
    assert_eq!(fs::read(dest.path().join("shot03.jpg")).unwrap(), b"bravo");
    assert_eq!(s.state.counter, 4);
}

#[test]
fn test_thumbnails_are_not_supported() {
    let root = storage();
    let (mut s, _) = session(&root);
    let err = run(&mut s, &["-q", "-f", "/DCIM/100", "--get-thumbnail", "1"]).unwrap_err();
    assert!(matches!(err, CliError::Device(_)));
}

#[test]
fn test_stdout_streams_file_with_size() {
    let root = storage();
    let (mut s, out) = session(&root);
    run(&mut s, &["--stdout-size", "-f", "/DCIM/100", "-p", "b.jpg"]).unwrap();
    assert_eq!(out.contents(), "5\nbravo");
}

#[test]
fn test_upload_mkdir_and_delete() {
    let root = storage();
    let local = TempDir::new().unwrap();
    let upload = local.path().join("new.jpg");
    fs::write(&upload, b"fresh").unwrap();
    let (mut s, _) = session(&root);

    run(
        &mut s,
        &["-q", "-m", "upload", "-f", "/upload", "-u", upload.to_str().unwrap(), "-d", "1"],
    )
    .unwrap();
    assert!(root.path().join("upload").is_dir());
    assert!(!root.path().join("upload/new.jpg").exists());

    run(&mut s, &["-f", "/DCIM/100", "-D", "-f", "/", "-r", "upload"]).unwrap();
    assert!(!root.path().join("upload").exists());
    assert!(root.path().join("DCIM/100").is_dir());
    assert!(!root.path().join("DCIM/100/a.jpg").exists());
    assert!(root.path().join("DCIM/top.jpg").exists());
}

#[test]
fn test_summary_names_the_root() {
    let root = storage();
    let (mut s, out) = session(&root);
    run(&mut s, &["--summary"]).unwrap();
    let text = out.contents();
    assert!(text.starts_with("Camera Summary:\nDirectory Browse at "));
    assert!(text.contains("Files: 3"));
}
