//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptContext, PromptDefinition};
use handlebars::Handlebars;
use veritas_core::{AppError, AppResult};

/// Render a prompt definition against a query and its numbered evidence.
///
/// Both the system message (when present) and the template are rendered with
/// the same context. Output is not HTML-escaped.
///
/// # Example
/// ```no_run
/// use veritas_prompt::{build_prompt, PromptContext, PromptDefinition};
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let context = PromptContext {
///     query: "What changed in Q3?".to_string(),
///     evidence: Vec::new(),
/// };
/// let built = build_prompt(&def, &context)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    context: &PromptContext,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt {} with {} evidence lines",
        definition.id,
        context.evidence.len()
    );

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    if let Some(ref system) = definition.system {
        handlebars
            .register_template_string("system", system)
            .map_err(|e| {
                AppError::Prompt(format!("Failed to register system template: {}", e))
            })?;
    }

    let data = serde_json::to_value(context)?;

    let user = handlebars
        .render("user", &data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    let system = match definition.system {
        Some(_) => Some(
            handlebars
                .render("system", &data)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to render system template: {}", e))
                })?
                .trim()
                .to_string(),
        ),
        None => None,
    };

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            evidence_count: context.evidence.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load_prompt, GROUNDED_ANSWER_PROMPT};
    use crate::types::{PromptBehavior, PromptEvidence, PromptOutputSpec};

    fn definition(template: &str, system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior::default(),
            system: system.map(str::to_string),
            template: template.to_string(),
            output: PromptOutputSpec::default(),
        }
    }

    fn context() -> PromptContext {
        PromptContext {
            query: "What did Q3 revenue do?".to_string(),
            evidence: vec![
                PromptEvidence {
                    marker: 1,
                    source_type: "document".to_string(),
                    source_id: "q3-report#0".to_string(),
                    text: "Revenue rose 12% to $4.2M.".to_string(),
                },
                PromptEvidence {
                    marker: 2,
                    source_type: "web".to_string(),
                    source_id: "https://news.example/acme".to_string(),
                    text: "Analysts called it <strong> growth & more.".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_query_without_escaping() {
        let def = definition("Q: {{query}} / {{evidence.[1].text}}", None);
        let built = build_prompt(&def, &context()).unwrap();

        assert_eq!(
            built.user,
            "Q: What did Q3 revenue do? / Analysts called it <strong> growth & more."
        );
        assert!(built.system.is_none());
        assert_eq!(built.metadata.evidence_count, 2);
    }

    #[test]
    fn test_builtin_prompt_numbers_evidence_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let def = load_prompt(temp.path(), GROUNDED_ANSWER_PROMPT).unwrap();
        let built = build_prompt(&def, &context()).unwrap();

        let lines: Vec<&str> = built.user.lines().map(str::trim).collect();
        assert!(lines.contains(&"[1] (document) Revenue rose 12% to $4.2M."));
        assert!(lines.iter().any(|l| l.starts_with("[2] (web) Analysts")));
        assert!(built.system.unwrap().contains("citation marker"));
        assert_eq!(built.metadata.source_prompt_id, GROUNDED_ANSWER_PROMPT);
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let def = definition("{{#each evidence}}unclosed", None);
        assert!(matches!(
            build_prompt(&def, &context()),
            Err(AppError::Prompt(_))
        ));
    }
}
