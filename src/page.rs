//! The HTML page that hands the token to the browser.
//!
//! Loaded once at startup and kept in memory; rendering is a string
//! substitution of [`PLACEHOLDER`].

use std::path::Path;

/// Marker replaced by the signed token.
pub const PLACEHOLDER: &str = "%%TOKEN%%";

const BUILTIN: &str = include_str!("../views/redirect.html");

/// Template failures, all fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template has no %%TOKEN%% placeholder")]
    MissingPlaceholder,
}

/// A cached page template.
#[derive(Debug, Clone)]
pub struct RedirectPage {
    template: String,
}

impl RedirectPage {
    /// The page compiled into the binary.
    pub fn builtin() -> Self {
        Self { template: BUILTIN.to_owned() }
    }

    pub fn from_template(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder);
        }
        Ok(Self { template })
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let template = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_template(template)
    }

    /// Loads `path` if given, else the built-in page.
    pub fn resolve(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    /// Substitutes every placeholder with `token`.
    ///
    /// Tokens are base64url segments joined by dots, so they need no HTML or
    /// JavaScript escaping.
    pub fn render(&self, token: &str) -> String {
        self.template.replace(PLACEHOLDER, token)
    }
}
