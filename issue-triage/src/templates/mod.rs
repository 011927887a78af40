//! Comment rendering using Handlebars.
//!
//! Write-capable steps post comments explaining what triage decided. The
//! comment bodies are Handlebars templates compiled once when the step is
//! built, so a broken template fails the pipeline build rather than a run.

mod error;

pub use error::TemplateError;

use crate::issue::{Issue, IssueId};
use handlebars::{no_escape, Handlebars};
use serde_json::json;

const DUPLICATE_TEMPLATE: &str = "duplicate";
const TRANSFER_TEMPLATE: &str = "transfer";

/// Creates a Handlebars registry suited to markdown comments.
///
/// HTML escaping is disabled and strict mode rejects unknown variables.
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs
}

/// Renders the comment posted by one triage step.
///
/// A renderer holds a single compiled template. Rendering the other kind of
/// comment fails with [`TemplateError::RenderError`].
#[derive(Debug, Clone)]
pub struct CommentRenderer {
    handlebars: Handlebars<'static>,
}

impl CommentRenderer {
    /// Compiles the comment template of the `duplicate` step.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::RegistrationError`] if the template does not parse.
    pub fn duplicate(template: &str) -> Result<Self, TemplateError> {
        Self::compile(DUPLICATE_TEMPLATE, template)
    }

    /// Compiles the comment template of the `transfer` step.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::RegistrationError`] if the template does not parse.
    pub fn transfer(template: &str) -> Result<Self, TemplateError> {
        Self::compile(TRANSFER_TEMPLATE, template)
    }

    fn compile(name: &str, template: &str) -> Result<Self, TemplateError> {
        let mut handlebars = create_handlebars_registry();
        handlebars.register_template_string(name, template)?;
        Ok(Self { handlebars })
    }

    /// Renders the comment for an issue flagged as a duplicate of `target`.
    ///
    /// Available variables: `issue`, `title`, `author`, `target`, `confidence`
    /// (a whole percentage).
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_duplicate(
        &self,
        issue: &Issue,
        target: &IssueId,
        confidence: f32,
    ) -> Result<String, TemplateError> {
        let data = json!({
            "issue": issue.id.to_string(),
            "title": issue.title,
            "author": issue.author,
            "target": target.to_string(),
            "confidence": (confidence * 100.0).round() as i64,
        });
        Ok(self.handlebars.render(DUPLICATE_TEMPLATE, &data)?)
    }

    /// Renders the comment for an issue about to move to `target`.
    ///
    /// Available variables: `issue`, `title`, `author`, `target`, `reason`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_transfer(
        &self,
        issue: &Issue,
        target: &str,
        reason: &str,
    ) -> Result<String, TemplateError> {
        let data = json!({
            "issue": issue.id.to_string(),
            "title": issue.title,
            "author": issue.author,
            "target": target,
            "reason": reason,
        });
        Ok(self.handlebars.render(TRANSFER_TEMPLATE, &data)?)
    }
}
