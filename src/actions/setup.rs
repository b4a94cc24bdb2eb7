//! Flags that adjust the session before the device is touched.

use super::required;
use crate::error::CliError;
use crate::options::Flow;
use crate::session::Session;
use crate::target::guess_port;

pub fn debug(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    session.state.debug = true;
    log::debug!("ALWAYS INCLUDE THE FOLLOWING LINE WHEN REPORTING PROBLEMS:");
    log::debug!("camctl {}: Turning on debug mode", env!("CARGO_PKG_VERSION"));
    Ok(Flow::Continue)
}

pub fn quiet(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Setting to quiet mode");
    session.set_quiet(true);
    Ok(Flow::Continue)
}

/// Send fetched files to stdout. Implies quiet so nothing else lands there.
pub fn stdout(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    session.set_quiet(true);
    session.state.stdout = true;
    Ok(Flow::Continue)
}

pub fn stdout_size(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    session.state.stdout_size = true;
    stdout(session, arg)
}

pub fn port(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let raw = required(arg, "port")?;
    log::debug!("Setting port to {}", raw);
    session.state.port = Some(guess_port(raw));
    Ok(Flow::Continue)
}

pub fn speed(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let raw = required(arg, "speed")?;
    log::debug!("Setting speed to {}", raw);
    let speed = raw
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| CliError::BadParameters(format!("invalid speed '{}'", raw)))?;
    session.state.speed = Some(speed);
    Ok(Flow::Continue)
}

pub fn camera(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let model = required(arg, "camera")?;
    log::debug!("Setting camera model to {}", model);
    session.state.model = Some(model.to_string());
    Ok(Flow::Continue)
}

pub fn filename(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let template = required(arg, "filename")?;
    log::debug!("Setting filename to {}", template);
    session.state.filename = template.to_string();
    session.state.filename_override = true;
    Ok(Flow::Continue)
}

pub fn folder(session: &mut Session, arg: Option<&str>) -> Result<Flow, CliError> {
    let folder = required(arg, "folder")?;
    log::debug!("Setting folder to {}", folder);
    session.state.folder = folder.to_string();
    Ok(Flow::Continue)
}

/// Recursion is the default; the flag only prints a notice.
pub fn recurse(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    session
        .context()
        .status("Recursion is now default and the use of --recurse or -R is now deprecated.");
    Ok(Flow::Continue)
}

pub fn no_recurse(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Clearing recursive mode");
    session.state.recurse = false;
    Ok(Flow::Continue)
}
