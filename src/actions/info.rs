//! Informational flags. None of these bind a camera.

use std::io::Write;

use crate::device::{Abilities, DriverStatus};
use crate::error::CliError;
use crate::options::{default_table, Flow};
use crate::session::Session;
use crate::target::lookup_model;

/// Hotplug script named in usb.usermap lines.
const USB_HOTPLUG_SCRIPT: &str = "usbcam";
/// Match on vendor and product id.
const USB_MATCH_VENDOR_PRODUCT: u16 = 0x0001 | 0x0002;

pub fn version(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Displaying version");
    writeln!(session.out(), "camctl {}", env!("CARGO_PKG_VERSION"))?;
    Ok(Flow::Exit)
}

pub fn help(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Displaying usage");
    let usage = default_table().usage();
    write!(session.out(), "{}", usage)?;
    Ok(Flow::Exit)
}

pub fn list_cameras(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    log::debug!("Listing cameras");
    let catalog = session.driver().abilities(session.context())?;
    let quiet = session.state.quiet;
    let out = session.out();

    if quiet {
        writeln!(out, "{}", catalog.len())?;
    } else {
        writeln!(out, "Number of supported cameras: {}", catalog.len())?;
        writeln!(out, "Supported cameras:")?;
    }
    for abilities in &catalog {
        if quiet {
            writeln!(out, "{}", abilities.model)?;
            continue;
        }
        match abilities.status {
            DriverStatus::Testing => writeln!(out, "\t\"{}\" (TESTING)", abilities.model)?,
            DriverStatus::Experimental => writeln!(out, "\t\"{}\" (EXPERIMENTAL)", abilities.model)?,
            DriverStatus::Production => writeln!(out, "\t\"{}\"", abilities.model)?,
        }
    }
    Ok(Flow::Continue)
}

/// One usb.usermap line per model that has both USB ids.
pub fn print_usb_usermap(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let catalog = session.driver().abilities(session.context())?;
    let out = session.out();
    for abilities in catalog.iter().filter(|a| a.usb_vendor != 0 && a.usb_product != 0) {
        writeln!(
            out,
            "{}               0x{:04x}      0x{:04x}   0x{:04x}    0x0000       0x0000       \
             0x00         0x00            0x00            0x00            0x00               \
             0x00               0x00000000",
            USB_HOTPLUG_SCRIPT, USB_MATCH_VENDOR_PRODUCT, abilities.usb_vendor, abilities.usb_product
        )?;
    }
    Ok(Flow::Continue)
}

pub fn list_ports(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let ports = session.driver().ports()?;
    let quiet = session.state.quiet;
    let out = session.out();

    if quiet {
        writeln!(out, "{}", ports.len())?;
    } else {
        writeln!(out, "Devices found: {}", ports.len())?;
        writeln!(out, "Path                             Description")?;
        writeln!(out, "{}", "-".repeat(62))?;
    }
    for port in &ports {
        writeln!(out, "{:<32} {:<32}", port.path, port.name)?;
    }
    Ok(Flow::Continue)
}

pub fn auto_detect(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let detected = session.driver().detect(session.context())?;
    let out = session.out();
    writeln!(out, "{:<30} {:<16}", "Model", "Port")?;
    writeln!(out, "{}", "-".repeat(58))?;
    for camera in &detected {
        writeln!(out, "{:<30} {:<16}", camera.model, camera.port)?;
    }
    Ok(Flow::Continue)
}

/// Capability table of the model named with `--camera`.
///
/// Needs only the catalog, so no camera is opened.
pub fn abilities(session: &mut Session, _arg: Option<&str>) -> Result<Flow, CliError> {
    let model = match session.state.model.clone() {
        Some(model) if !model.is_empty() => model,
        _ => {
            session.context().error("You need to specify a camera model");
            return Err(CliError::BadParameters("no camera model given".to_string()));
        }
    };

    let catalog = session.driver().abilities(session.context())?;
    let index = lookup_model(&catalog, &model).ok_or(CliError::ModelNotFound(model))?;
    print_abilities(session.out(), &catalog[index])?;
    Ok(Flow::Continue)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Parsing friendly table; split lines on `:`.
fn print_abilities(out: &mut dyn Write, a: &Abilities) -> std::io::Result<()> {
    writeln!(out, "Abilities for camera             : {}", a.model)?;
    writeln!(out, "Serial port support              : {}", yes_no(a.ports.serial))?;
    writeln!(out, "USB support                      : {}", yes_no(a.ports.usb))?;
    if !a.speeds.is_empty() {
        writeln!(out, "Transfer speeds supported        :")?;
        for speed in &a.speeds {
            writeln!(out, "                                 : {}", speed)?;
        }
    }
    writeln!(out, "Capture choices                  :")?;
    let choices = [
        (a.capture.image, "Image"),
        (a.capture.video, "Video"),
        (a.capture.audio, "Audio"),
        (a.capture.preview, "Preview"),
    ];
    for (_, name) in choices.iter().filter(|(supported, _)| *supported) {
        writeln!(out, "                                 : {}", name)?;
    }
    writeln!(out, "Configuration support            : {}", yes_no(a.capture.config))?;
    writeln!(out, "Delete files on camera support   : {}", yes_no(a.delete))?;
    writeln!(out, "File preview (thumbnail) support : {}", yes_no(a.preview))?;
    writeln!(out, "File upload support              : {}", yes_no(a.upload))?;
    Ok(())
}
