//! Captures and the text reports a driver produces about itself.

use std::io::Write;

use crate::device::{CaptureKind, FileKind};
use crate::error::CliError;
use crate::options::Flow;
use crate::output::{resolve_target, save_file};
use crate::session::Session;

/// Trigger a capture and report where the new file lives on the camera.
fn capture_generic(session: &mut Session, kind: CaptureKind) -> Result<Flow, CliError> {
    log::debug!("Capturing {:?}", kind);
    let mut dev = session.device()?;
    let path = match dev.capture(kind) {
        Ok(path) => path,
        Err(e) => {
            dev.ctx.error("Could not capture.");
            return Err(e);
        }
    };

    if dev.state.quiet {
        writeln!(dev.out(), "{}", path)?;
    } else {
        writeln!(dev.out(), "New file is in location {} on the camera", path)?;
    }
    Ok(Flow::Continue)
}

pub fn capture_image(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    capture_generic(session, CaptureKind::Image)
}

pub fn capture_movie(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    capture_generic(session, CaptureKind::Movie)
}

pub fn capture_sound(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    capture_generic(session, CaptureKind::Sound)
}

/// Grab a preview frame and save it locally. Always goes to a file, even
/// with `--stdout`.
pub fn capture_preview(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let file = match dev.capture_preview() {
        Ok(file) => file,
        Err(e) => {
            dev.ctx.error("Could not capture preview.");
            return Err(e);
        }
    };
    let target = resolve_target(dev.state, &file.name, FileKind::Normal);
    save_file(dev.terminal, dev.state.quiet, &target, &file.data)?;
    Ok(Flow::Continue)
}

pub fn summary(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let text = dev.summary()?;
    writeln!(dev.out(), "Camera Summary:\n{}", text)?;
    Ok(Flow::Continue)
}

pub fn manual(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let text = dev.manual()?;
    writeln!(dev.out(), "Camera Manual:\n{}", text)?;
    Ok(Flow::Continue)
}

pub fn about(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let mut dev = session.device()?;
    let text = dev.about()?;
    writeln!(dev.out(), "About the library:\n{}", text)?;
    Ok(Flow::Continue)
}
