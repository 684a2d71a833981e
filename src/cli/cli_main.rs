use crate::pipeline::{Pipeline, PipelineError};
use crate::settings::{DEFAULT_CONFIG_FILE, RunSettings};
use log::error;
use std::io::{self, Write};

/// Entry point of the binary. With a molecule id in `args` a single analysis is run,
/// otherwise the interactive menu is shown.
pub fn run_cli(args: &[String], settings: RunSettings) -> Result<(), PipelineError> {
    match args.first() {
        Some(molecule) => analyze_molecule(molecule, &settings),
        None => {
            run_interactive_menu(settings);
            Ok(())
        }
    }
}

pub fn analyze_molecule(molecule: &str, settings: &RunSettings) -> Result<(), PipelineError> {
    let pipeline = Pipeline::new(settings.clone())?;
    let run = pipeline.run(molecule)?;
    pipeline.report(&run)
}

pub fn run_interactive_menu(settings: RunSettings) {
    loop {
        show_main_menu();
        let choice = get_user_input();

        match choice.trim() {
            "1" => {
                print!("\x1b[36mEnter KEGG molecule id (e.g. C00031): \x1b[0m");
                let _ = io::stdout().flush();
                let molecule = get_user_input();
                if let Err(e) = analyze_molecule(molecule.trim(), &settings) {
                    error!("{}", e);
                    println!("Error: {}", e);
                }
            }
            "2" => match serde_json::to_string_pretty(&settings) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("Error: {}", e),
            },
            "3" => match settings.save(DEFAULT_CONFIG_FILE) {
                Ok(()) => println!("Settings written to {}", DEFAULT_CONFIG_FILE),
                Err(e) => println!("Error: {}", e),
            },
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
/* colors
Blue (\x1b[34m) - header
Yellow (\x1b[33m) - menu options
Cyan (\x1b[36m) - prompts
*/
fn show_main_menu() {
    println!(
        "\x1b[34m\n KeggKinetics: reaction networks of KEGG compounds\n
    and their first-order kinetics \n \x1b[0m"
    );
    println!("\x1b[33m1. Analyze molecule\x1b[0m");
    println!("\x1b[33m2. Show settings\x1b[0m");
    println!("\x1b[33m3. Save settings to {}\x1b[0m", DEFAULT_CONFIG_FILE);
    println!("\x1b[33m0. Exit\x1b[0m");
    print!("\x1b[36mEnter your choice: \x1b[0m");
    let _ = io::stdout().flush();
}

/// one line from stdin, end of input is read as "0" (exit)
fn get_user_input() -> String {
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => "0".to_string(),
        Ok(_) => input,
    }
}
