use KeggKinetics::cli::cli_main::run_cli;
use KeggKinetics::settings::{DEFAULT_CONFIG_FILE, RunSettings};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

pub fn main() {
    let settings = RunSettings::load_or_default(DEFAULT_CONFIG_FILE);
    let _ = TermLogger::init(
        settings.log_level_filter(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run_cli(&args, settings) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
