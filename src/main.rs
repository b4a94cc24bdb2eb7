use std::io::Write;
use std::sync::Arc;

use camctl::config::Config;
use camctl::context::{CancelToken, Context};
use camctl::device::DirectoryDriver;
use camctl::interrupt;
use camctl::options::{default_table, report_failure};
use camctl::session::Session;
use camctl::settings::FileSettings;
use camctl::terminal::Terminal;

const LOG_ENV: &str = "CAMCTL_LOG";

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(LOG_ENV)
        .format_timestamp(None)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let table = default_table();

    // Settings that must be known before anything else runs.
    let quiet = table.is_present("quiet", &args);
    let debug = table.is_present("debug", &args);
    init_logging(debug);

    let config = match Config::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Failed to load config file: {}", e);
            log::warn!("Using default settings.");
            Config::default()
        }
    };

    let mut state = config.session_state();
    state.quiet = quiet;
    state.debug = debug;

    let token = CancelToken::new();
    let context = Arc::new(Context::new(token.clone()));

    let settings_path = config.settings_path();
    let settings = match FileSettings::load(settings_path.clone()) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("{}", e);
            FileSettings::empty(settings_path)
        }
    };

    let driver = DirectoryDriver::new(config.browse_root());
    let mut session = Session::new(
        state,
        Box::new(driver),
        Box::new(settings),
        context,
        Terminal::stdio(),
    );

    if let Err(e) = interrupt::install(token, session.release_handle()) {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }

    if let Err(e) = table.verify(&args) {
        eprintln!("{}", e);
        if !quiet {
            print!("{}", table.usage());
        }
        std::process::exit(1);
    }

    let result = table.execute(&mut session, &args);
    session.release();

    if let Err(e) = result {
        let debug = session.state.debug;
        let mut stdout = std::io::stdout();
        let mut stderr = std::io::stderr();
        if let Err(io) = report_failure(&e, &args, debug, &mut stdout, &mut stderr) {
            log::warn!("Could not report error: {}", io);
        }
        let _ = stdout.flush();
        std::process::exit(1);
    }
}
