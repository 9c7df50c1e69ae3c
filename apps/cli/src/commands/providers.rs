//! `tagsmith providers` - list supported providers.

use colored::Colorize;
use tagsmith_models::ProviderKind;

pub fn execute() {
    println!("{}", "Supported providers:".bold());
    for provider in ProviderKind::ALL {
        let key_note = if provider.requires_api_key() {
            format!("requires {}", provider.api_key_env())
        } else {
            format!("{} optional", provider.api_key_env())
        };
        println!(
            "  {:<14} default model: {:<40} {}",
            provider.as_str().green(),
            provider.default_model(),
            key_note.dimmed()
        );
    }
}
