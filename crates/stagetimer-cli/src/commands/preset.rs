use clap::Subcommand;
use stagetimer_core::format::format_preset_durations;
use stagetimer_core::storage::{JsonTimerStore, TimerStore};
use stagetimer_core::Preset;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List presets (the default preset is starred)
    List,
    /// Add or update a preset
    Add {
        /// Preset title
        title: String,
        /// Intro duration in seconds
        #[arg(long)]
        intro: u32,
        /// Main duration in seconds
        #[arg(long)]
        main: u32,
        /// Outro duration in seconds
        #[arg(long)]
        outro: u32,
        /// Preset id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Disallow skipping segments
        #[arg(long)]
        no_skip: bool,
        /// Enable the completion sound
        #[arg(long)]
        sound: bool,
        /// Mark as the default preset
        #[arg(long)]
        default: bool,
    },
    /// Remove a preset
    Remove {
        /// Preset id
        id: String,
    },
    /// Set the default preset
    SetDefault {
        /// Preset id
        id: String,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonTimerStore::open()?;
    match action {
        PresetAction::List => {
            let default_id = store.default_preset_id();
            for preset in store.load_presets() {
                let marker = if default_id.as_deref() == Some(preset.id()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {:<24} {:<26} {}",
                    preset.id(),
                    format_preset_durations(
                        preset.intro_sec(),
                        preset.main_sec(),
                        preset.outro_sec()
                    ),
                    preset.title()
                );
            }
        }
        PresetAction::Add {
            title,
            intro,
            main,
            outro,
            id,
            no_skip,
            sound,
            default,
        } => {
            let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let preset = Preset::new(id, title, intro, main, outro, !no_skip, sound)?;
            store.save_preset(&preset)?;
            if default {
                store.set_default_preset_id(Some(preset.id()))?;
            }
            println!("{}", preset.id());
        }
        PresetAction::Remove { id } => {
            store.delete_preset(&id)?;
            println!("ok");
        }
        PresetAction::SetDefault { id } => {
            if !store.load_presets().iter().any(|p| p.id() == id) {
                return Err(format!("unknown preset: {id}").into());
            }
            store.set_default_preset_id(Some(&id))?;
            println!("ok");
        }
    }
    Ok(())
}
