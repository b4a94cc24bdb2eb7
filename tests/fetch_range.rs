//! Fetching a range into the working directory under the remote names.
//!
//! Kept to a single test because it changes the process working directory.

use std::sync::Arc;

use camctl::context::{CancelToken, Context};
use camctl::device::{Abilities, MemoryDriver, PortInfo};
use camctl::options::default_table;
use camctl::settings::MemorySettings;
use camctl::terminal::{SharedBuffer, Terminal};
use camctl::{Session, SessionState};
use tempfile::TempDir;

#[test]
fn test_get_image_range_saves_remote_names() {
    let driver = (1..=6).fold(
        MemoryDriver::new()
            .with_model(Abilities::named("ModelX"))
            .with_port(PortInfo::new("usb:", "Universal Serial Bus")),
        |d, i| d.with_file("/store", &format!("IMG_{:04}.JPG", i), format!("image {}", i).as_bytes()),
    );
    let device = driver.state();

    let cwd = TempDir::new().unwrap();
    std::env::set_current_dir(cwd.path()).unwrap();
    // An existing file is overwritten after a "y" at the prompt.
    std::fs::write("IMG_0003.JPG", b"stale").unwrap();

    let out = SharedBuffer::new();
    let context = Arc::new(Context::with_writer(CancelToken::new(), Box::new(SharedBuffer::new())));
    let terminal = Terminal::new(Box::new(out.clone()), Box::new(std::io::Cursor::new(b"y\n".to_vec())));
    let mut session = Session::new(
        SessionState::default(),
        Box::new(driver),
        Box::new(MemorySettings::new()),
        context,
        terminal,
    );

    let args = ["--camera", "ModelX", "--port", "usb:", "--folder", "/store", "--get-image", "2-4"];
    let table = default_table();
    table.verify(&args).unwrap();
    table.execute(&mut session, &args).unwrap();

    let mut saved: Vec<String> = std::fs::read_dir(cwd.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();
    assert_eq!(saved, vec!["IMG_0002.JPG", "IMG_0003.JPG", "IMG_0004.JPG"]);
    assert_eq!(std::fs::read("IMG_0003.JPG").unwrap(), b"image 3");

    let text = out.contents();
    assert!(text.contains("File IMG_0003.JPG exists. Overwrite? [y|n] "));
    assert!(text.contains("Saving file as IMG_0002.JPG\n"));
    assert!(text.contains("Saving file as IMG_0004.JPG\n"));
    assert_eq!(device.lock().unwrap().fetched.len(), 3);
}
