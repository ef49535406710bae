// Cache file management

use anyhow::Result;

use crate::cli::CacheCommands;
use crate::manager::{Session, ensure_file};
use crate::utils::{OutputStyle, print_success};

pub fn handle_cache_command(session: &mut Session, command: CacheCommands) -> Result<()> {
    match command {
        CacheCommands::Set { file } => {
            ensure_file(&file)?;
            let file = std::path::absolute(&file)?;
            session.core.set_cache_file(Some(&file))?;

            session.config.general.cache_file = Some(file.clone());
            session.save_config()?;
            print_success(&format!("Cache moved to {}", file.display()));
        }
        CacheCommands::Show => match session.core.cache_file() {
            Some(file) => OutputStyle::print_field_colored("Cache", &file.display().to_string(), OutputStyle::info),
            None => println!("{}", OutputStyle::muted("No cache file in use")),
        },
    }
    Ok(())
}
