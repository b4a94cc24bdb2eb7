//! Batch iteration over remote files and folders.
//!
//! Every walk takes one listing snapshot per folder before running the
//! action, so actions that change the folder (delete) do not shift the
//! indices of later items. The first failing action ends the walk.

use crate::device::join_folder;
use crate::error::CliError;
use crate::range::{looks_like_filename, RangeSpec};
use crate::session::Device;

/// Run `action(device, folder, name)` on every file in `folder`.
pub fn for_each_file<F>(dev: &mut Device<'_>, folder: &str, action: &mut F) -> Result<(), CliError>
where
    F: FnMut(&mut Device<'_>, &str, &str) -> Result<(), CliError>,
{
    let files = dev.list_files(folder)?;
    log::debug!("{} files in {}", files.len(), folder);
    for name in &files {
        action(dev, folder, name)?;
    }
    Ok(())
}

/// Run `visit(device, path)` on every subfolder of `folder`, depth first.
///
/// Each subfolder is visited before its own children. With `recurse`
/// unset only the direct children are visited.
pub fn for_each_subfolder<F>(
    dev: &mut Device<'_>,
    folder: &str,
    recurse: bool,
    visit: &mut F,
) -> Result<(), CliError>
where
    F: FnMut(&mut Device<'_>, &str) -> Result<(), CliError>,
{
    for name in dev.list_folders(folder)? {
        let path = join_folder(folder, &name);
        visit(dev, &path)?;
        if recurse {
            for_each_subfolder(dev, &path, recurse, visit)?;
        }
    }
    Ok(())
}

/// Run `action` on every file of `folder`, then on every file of each
/// subfolder when `recurse` is set.
pub fn for_all_files<F>(
    dev: &mut Device<'_>,
    folder: &str,
    recurse: bool,
    action: &mut F,
) -> Result<(), CliError>
where
    F: FnMut(&mut Device<'_>, &str, &str) -> Result<(), CliError>,
{
    for_each_file(dev, folder, action)?;
    if !recurse {
        return Ok(());
    }
    for_each_subfolder(dev, folder, true, &mut |dev, path| {
        for_each_file(dev, path, action)
    })
}

/// Run `action` on the files of `folder` selected by `arg`.
///
/// `arg` is a range expression over the 1-based listing, or a plain
/// filename which is acted on directly without listing the folder.
pub fn for_each_in_range<F>(
    dev: &mut Device<'_>,
    folder: &str,
    arg: &str,
    action: &mut F,
) -> Result<(), CliError>
where
    F: FnMut(&mut Device<'_>, &str, &str) -> Result<(), CliError>,
{
    if looks_like_filename(arg) {
        return action(dev, folder, arg);
    }

    let spec = RangeSpec::parse(arg)?;
    let files = dev.list_files(folder)?;
    let selected = spec.indices(files.len());
    log::debug!("Range '{}' selects {} of {} files", arg, selected.len(), files.len());

    for index in selected {
        action(dev, folder, &files[index - 1])?;
    }
    Ok(())
}
