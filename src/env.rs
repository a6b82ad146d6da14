//! The embeddable environment: owns parsed templates, the variable mapping,
//! and the accumulated error list.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::ast::Template;
use crate::error::TemplateError;
use crate::evaluator::Evaluator;
use crate::parser;
use crate::value::Value;

#[derive(Default)]
pub struct Environment {
    templates: HashMap<String, Template>,
    variables: HashMap<String, Value>,
    errors: Vec<TemplateError>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Parse `source` and register it as `name`. Returns `true` if it parsed
    /// without error; either way its errors (if any) are appended to the
    /// environment's error list.
    pub fn add_template(&mut self, name: &str, source: &str) -> bool {
        let (template, mut errors) = parser::parse(name, source);
        let ok = errors.is_empty();
        self.errors.append(&mut errors);
        self.templates.insert(name.to_string(), template);
        ok
    }

    /// Non-recursive directory walk: every regular file is loaded as a
    /// template named after its filename; subdirectories are silently
    /// skipped. An unreadable directory or file is recorded as an I/O error.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.errors.push(TemplateError::io(
                    dir.display().to_string(),
                    format!("failed to read directory: {err}"),
                ));
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.errors.push(TemplateError::io(
                        dir.display().to_string(),
                        format!("failed to read directory entry: {err}"),
                    ));
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match fs::read_to_string(&path) {
                Ok(source) => {
                    self.add_template(&name, &source);
                }
                Err(err) => {
                    self.errors
                        .push(TemplateError::io(name, format!("failed to read file: {err}")));
                }
            }
        }
    }

    /// Render `name`, resolving any inheritance chain. `None` only when
    /// `name` or one of its ancestors is undefined; any other evaluation
    /// error still yields the partial output accumulated so far.
    pub fn render(&mut self, name: &str) -> Option<String> {
        let mut evaluator = Evaluator::new(&self.templates, self.variables.clone());
        let out = evaluator.render(name);
        let mut new_errors = evaluator.into_errors();
        self.errors.append(&mut new_errors);
        out
    }

    pub fn check_errors(&self) -> Option<&[TemplateError]> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }

    pub fn errors(&self) -> &[TemplateError] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_template_collects_parse_errors() {
        let mut env = Environment::new();
        let ok = env.add_template("bad", "{% for v in xs %}{{ v }}");
        assert!(!ok);
        assert!(env.check_errors().is_some());
    }

    #[test]
    fn render_round_trips_content_only_template() {
        let mut env = Environment::new();
        env.add_template("t", "hello, world");
        assert_eq!(env.render("t").as_deref(), Some("hello, world"));
        assert!(env.check_errors().is_none());
    }

    #[test]
    fn render_missing_template_is_none() {
        let mut env = Environment::new();
        assert!(env.render("missing").is_none());
        assert!(env.check_errors().is_some());
    }
}
