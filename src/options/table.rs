//! The camctl option table.
//!
//! Declaration order is the order of the help screen.

use super::{OptionDescriptor as Opt, OptionTable};
use crate::actions::{capture, files, info, setup};

/// Every flag camctl understands.
pub fn default_table() -> OptionTable {
    OptionTable::new(vec![
        // Output settings, peeked before anything runs
        Opt::switch(None, "debug", "Turn on debugging", setup::debug),
        Opt::switch(Some('q'), "quiet", "Quiet output (default=verbose)", setup::quiet),
        // Informational
        Opt::switch(Some('v'), "version", "Display version and exit", info::version),
        Opt::switch(Some('h'), "help", "Displays this help screen", info::help),
        Opt::switch(None, "list-cameras", "List supported camera models", info::list_cameras),
        Opt::switch(None, "print-usb-usermap", "Create output for usb.usermap", info::print_usb_usermap),
        Opt::switch(None, "list-ports", "List supported port devices", info::list_ports),
        Opt::switch(None, "stdout", "Send file to stdout", setup::stdout),
        Opt::switch(None, "stdout-size", "Print filesize before data", setup::stdout_size),
        Opt::switch(None, "auto-detect", "List auto-detected cameras", info::auto_detect),
        // Target selection
        Opt::with_arg(None, "port", "path", "Specify port device", setup::port),
        Opt::with_arg(None, "speed", "speed", "Specify serial transfer speed", setup::speed),
        Opt::with_arg(None, "camera", "model", "Specify camera model", setup::camera),
        Opt::with_arg(None, "filename", "filename", "Specify a filename", setup::filename),
        // Actions that depend on the settings above
        Opt::switch(Some('a'), "abilities", "Display camera abilities", info::abilities),
        Opt::with_arg(Some('f'), "folder", "folder", "Specify camera folder (default=\"/\")", setup::folder),
        Opt::switch(Some('R'), "recurse", "Recursion (default - do not use)", setup::recurse),
        Opt::switch(None, "no-recurse", "Turn off recursion", setup::no_recurse),
        Opt::switch(Some('l'), "list-folders", "List folders in folder", files::list_folders),
        Opt::switch(Some('L'), "list-files", "List files in folder", files::list_files),
        Opt::with_arg(Some('m'), "mkdir", "name", "Create a directory", files::make_dir),
        Opt::with_arg(Some('r'), "rmdir", "name", "Remove a directory", files::remove_dir),
        Opt::switch(Some('n'), "num-images", "Display number of pictures", files::num_images),
        Opt::with_arg(Some('p'), "get-image", "range", "Get pictures given in range", files::get_image),
        Opt::switch(Some('P'), "get-all-images", "Get all pictures from folder", files::get_all_images),
        Opt::with_arg(Some('t'), "get-thumbnail", "range", "Get thumbnails given in range", files::get_thumbnail),
        Opt::switch(Some('T'), "get-all-thumbnails", "Get all thumbnails from folder", files::get_all_thumbnails),
        Opt::with_arg(None, "get-raw-data", "range", "Get raw data given in range", files::get_raw_data),
        Opt::switch(None, "get-all-raw-data", "Get all raw data from folder", files::get_all_raw_data),
        Opt::with_arg(None, "get-audio-data", "range", "Get audio data given in range", files::get_audio_data),
        Opt::switch(None, "get-all-audio-data", "Get all audio data from folder", files::get_all_audio_data),
        Opt::with_arg(Some('d'), "delete-picture", "range", "Delete pictures given in range", files::delete_picture),
        Opt::switch(Some('D'), "delete-all-images", "Delete all pictures in folder", files::delete_all_images),
        Opt::with_arg(Some('u'), "upload-image", "filename", "Upload a picture to camera", files::upload_image),
        Opt::switch(None, "capture-preview", "Capture a quick preview", capture::capture_preview),
        Opt::switch(None, "capture-image", "Capture an image", capture::capture_image),
        Opt::switch(None, "capture-movie", "Capture a movie", capture::capture_movie),
        Opt::switch(None, "capture-sound", "Capture an audio clip", capture::capture_sound),
        Opt::switch(None, "summary", "Summary of camera status", capture::summary),
        Opt::switch(None, "manual", "Camera driver manual", capture::manual),
        Opt::switch(None, "about", "About the camera driver", capture::about),
    ])
}
