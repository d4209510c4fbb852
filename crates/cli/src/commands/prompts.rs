//! Prompts command handler.

use clap::Args;
use veritas_core::{config::AppConfig, AppResult};
use veritas_prompt::{list_prompts, load_prompt};

/// List or show answer prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Prompt to show; lists all prompts when omitted
    pub id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let Some(ref id) = self.id else {
            let ids = list_prompts(&config.workspace)?;
            if self.json {
                return super::print_json(&ids);
            }
            for id in ids {
                let marker = if id == config.llm.prompt_id { " (active)" } else { "" };
                println!("{}{}", id, marker);
            }
            return Ok(());
        };

        let prompt = load_prompt(&config.workspace, id)?;
        if self.json {
            return super::print_json(&prompt);
        }

        println!("{} - {}", prompt.id, prompt.title);
        if let Some(ref system) = prompt.system {
            println!();
            println!("System:");
            println!("{}", system.trim_end());
        }
        println!();
        println!("Template:");
        println!("{}", prompt.template.trim_end());
        Ok(())
    }
}
