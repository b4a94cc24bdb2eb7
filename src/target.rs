//! Target resolution: pick exactly one (model, port) binding.
//!
//! Priority for the model: explicit `--camera`, then a single auto-detected
//! camera, then the first of several detected cameras, then the persisted
//! default. The port follows the same order: explicit `--port`, the port
//! auto-detection reported, then the persisted default. Directory Browse
//! needs no port.

use std::sync::Arc;

use crate::context::Context;
use crate::device::{
    Abilities, Camera, Driver, PortInfo, PortType, DIRECTORY_BROWSE,
};
use crate::error::CliError;
use crate::settings::{SettingsStore, MODEL_KEY, PORT_KEY};

/// What the user asked for, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRequest {
    pub model: Option<String>,
    pub port: Option<String>,
    pub speed: Option<u32>,
    pub quiet: bool,
}

/// The resolved model and port. Immutable for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBinding {
    /// Index of the model in the driver's catalog
    pub model_index: usize,
    pub abilities: Abilities,
    /// `None` for Directory Browse
    pub port: Option<PortInfo>,
}

impl DeviceBinding {
    pub fn model(&self) -> &str {
        &self.abilities.model
    }
}

/// Turn a port value without a scheme into a full port path.
///
/// - `usb` becomes `usb:`
/// - `/dev/...` becomes `serial:/dev/...`
/// - `/proc/...` becomes `usb:/proc/...`
///
/// Anything containing `:` or matching none of the above is returned as is.
pub fn guess_port(raw: &str) -> String {
    if raw.contains(':') {
        return raw.to_string();
    }

    let guessed = if raw == "usb" {
        "usb:".to_string()
    } else if raw.starts_with("/dev/") {
        format!("serial:{}", raw)
    } else if raw.starts_with("/proc/") {
        format!("usb:{}", raw)
    } else {
        return raw.to_string();
    };

    log::debug!(
        "Ports must look like 'serial:/dev/ttyS0' or 'usb:', but '{}' is missing a colon. Using port '{}'",
        raw,
        guessed
    );
    guessed
}

/// Position of `model` in the catalog, matched exactly.
pub fn lookup_model(catalog: &[Abilities], model: &str) -> Option<usize> {
    catalog.iter().position(|a| a.model == model)
}

/// Position of `path` in the port list.
///
/// An exact path match wins; a bare scheme such as `usb:` otherwise matches
/// the first port of that class.
pub fn lookup_port(ports: &[PortInfo], path: &str) -> Option<usize> {
    if let Some(index) = ports.iter().position(|p| p.path == path) {
        return Some(index);
    }
    let scheme = path.strip_suffix(':')?;
    if scheme.is_empty() || scheme.contains(':') {
        return None;
    }
    ports
        .iter()
        .position(|p| p.path.split_once(':').map(|(s, _)| s) == Some(scheme))
}

/// Resolve the binding and open the camera.
///
/// On success the model and port are persisted as new defaults, the serial
/// speed is applied when requested and the port is serial, and the
/// context's status sinks are installed on the camera.
pub fn resolve(
    driver: &dyn Driver,
    request: &TargetRequest,
    settings: &mut dyn SettingsStore,
    ctx: &Arc<Context>,
) -> Result<(DeviceBinding, Box<dyn Camera>), CliError> {
    log::debug!("Resolving camera binding...");

    let catalog = driver.abilities(ctx)?;
    let ports = driver.ports()?;

    let mut detected_port: Option<String> = None;
    let model_index = match request.model.as_deref().filter(|m| !m.is_empty()) {
        Some(model) => {
            lookup_model(&catalog, model).ok_or_else(|| CliError::ModelNotFound(model.to_string()))?
        }
        None => {
            let detected = driver.detect(ctx)?;
            match detected.len() {
                0 => {
                    let saved = settings.get(MODEL_KEY).unwrap_or_default();
                    match lookup_model(&catalog, &saved) {
                        Some(index) => {
                            log::debug!("Using saved model '{}'", saved);
                            index
                        }
                        None => {
                            ctx.error("Please specify a model.");
                            return Err(CliError::MustSpecifyModel);
                        }
                    }
                }
                count => {
                    let first = &detected[0];
                    if count > 1 {
                        log::warn!(
                            "{} cameras detected, using the first one ('{}' on '{}')",
                            count,
                            first.model,
                            first.port
                        );
                    }
                    detected_port = Some(first.port.clone());
                    lookup_model(&catalog, &first.model)
                        .ok_or_else(|| CliError::ModelNotFound(first.model.clone()))?
                }
            }
        }
    };
    let abilities = catalog[model_index].clone();

    let port = if abilities.model == DIRECTORY_BROWSE {
        None
    } else {
        Some(resolve_port(request, detected_port.as_deref(), &ports, settings, ctx)?)
    };

    let mut camera = driver.open(&abilities, port.as_ref(), ctx)?;

    if let Err(e) = settings.set(MODEL_KEY, &abilities.model) {
        log::warn!("Could not save model: {}", e);
    }
    if let Some(port) = &port {
        if let Err(e) = settings.set(PORT_KEY, &port.path) {
            log::warn!("Could not save port: {}", e);
        }
    }

    // Speed is a serial-only setting; drivers reject it on anything else.
    if let Some(speed) = request.speed {
        match &port {
            Some(p) if p.port_type() == PortType::Serial => camera.set_port_speed(speed)?,
            _ => log::debug!("Ignoring speed {} for non-serial port", speed),
        }
    }

    install_sinks(camera.as_mut(), ctx, request.quiet);

    log::debug!(
        "Bound to '{}' on {}",
        abilities.model,
        port.as_ref().map(|p| p.path.as_str()).unwrap_or("no port")
    );

    Ok((
        DeviceBinding {
            model_index,
            abilities,
            port,
        },
        camera,
    ))
}

fn resolve_port(
    request: &TargetRequest,
    detected: Option<&str>,
    ports: &[PortInfo],
    settings: &dyn SettingsStore,
    ctx: &Context,
) -> Result<PortInfo, CliError> {
    if let Some(explicit) = request.port.as_deref().filter(|p| !p.is_empty()) {
        return match lookup_port(ports, explicit) {
            Some(index) => Ok(ports[index].clone()),
            None => {
                ctx.error(&format!(
                    "The port you specified ('{}') can not be found. Please specify one of the \
                     ports found by 'camctl --list-ports' and make sure the spelling is correct \
                     (i.e. with prefix 'serial:' or 'usb:').",
                    explicit
                ));
                Err(CliError::UnknownPort(explicit.to_string()))
            }
        };
    }

    if let Some(path) = detected {
        return lookup_port(ports, path)
            .map(|index| ports[index].clone())
            .ok_or_else(|| CliError::UnknownPort(path.to_string()));
    }

    let saved = settings.get(PORT_KEY).unwrap_or_default();
    match lookup_port(ports, &saved) {
        Some(index) => {
            log::debug!("Using saved port '{}'", saved);
            Ok(ports[index].clone())
        }
        None => {
            ctx.error("Please specify a port.");
            Err(CliError::UnknownPort(saved))
        }
    }
}

fn install_sinks(camera: &mut dyn Camera, ctx: &Arc<Context>, quiet: bool) {
    let status_ctx = Arc::clone(ctx);
    let message_ctx = Arc::clone(ctx);
    camera.set_sinks(
        Box::new(move |text| {
            if !quiet {
                status_ctx.status(text);
            }
        }),
        Box::new(move |text| message_ctx.status(text)),
    );
}
