use clap::Subcommand;
use meeetimer_core::timer::{preset, presets};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List the quick-setup presets
    List,
    /// Show the settings for one preset length
    Show {
        /// Length in minutes
        minutes: u64,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetAction::List => {
            println!("{}", serde_json::to_string_pretty(&presets())?);
        }
        PresetAction::Show { minutes } => {
            let settings = preset(minutes)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
