//! Saved API key management

use crate::cli::commands::KeyCommands;
use crate::cli::output::mask_secret;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::settings::CachedSettings;
use crate::settings::FileSettingsStore;
use crate::AppConfig;
use crate::Result;

pub fn handle_key_command(config: &AppConfig, command: KeyCommands) -> Result<()> {
    let store = FileSettingsStore::new(&config.client.settings_path);
    let path = store.path().display().to_string();
    let mut settings = CachedSettings::open(Box::new(store))?;

    match command {
        KeyCommands::Set { key } => {
            if settings.set_api_key(key.trim())? {
                print_success(&format!("API key saved to {path}"));
            } else {
                print_info("API key unchanged");
            }
        }
        KeyCommands::Show => {
            if settings.get().has_api_key() {
                println!("🔑 {}", mask_secret(&settings.get().api_key));
            } else {
                print_info("No API key saved");
            }
        }
        KeyCommands::Clear => {
            settings.set_api_key("")?;
            print_success("API key cleared");
        }
    }
    Ok(())
}
