//! Prompt loader for YAML prompt definitions.
//!
//! Prompts are looked up in `.veritas/prompts/<id>.yml` first, then among the
//! definitions compiled into the binary.

use crate::types::PromptDefinition;
use std::path::{Path, PathBuf};
use veritas_core::{AppError, AppResult};

/// Identifier of the default grounded-answer prompt.
pub const GROUNDED_ANSWER_PROMPT: &str = "answer.grounded";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    GROUNDED_ANSWER_PROMPT,
    include_str!("../prompts/answer.grounded.yml"),
)];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".veritas").join("prompts")
}

/// Load a prompt definition by ID.
///
/// # Example
/// ```no_run
/// use veritas_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer.grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    let (origin, contents) = if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);
        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        (prompt_file.display().to_string(), contents)
    } else if let Some((_, builtin)) = BUILTIN_PROMPTS.iter().find(|(id, _)| *id == prompt_id) {
        ("built-in".to_string(), (*builtin).to_string())
    } else {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' not found in {:?} or built-ins",
            prompt_id,
            prompts_dir(workspace_path)
        )));
    };

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        tracing::warn!(
            "Prompt file for '{}' declares id '{}'",
            prompt_id,
            definition.id
        );
    }

    tracing::debug!(
        "Loaded prompt: {} ({}) from {}",
        definition.id,
        definition.title,
        origin
    );
    Ok(definition)
}

/// List available prompt IDs: built-ins plus workspace files, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: '{}'. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
