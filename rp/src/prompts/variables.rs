//! Substitution variables
//!
//! Values are coerced to text when inserted, so a template never sees
//! anything but strings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use handlebars::TemplateError;
use handlebars::template::{Parameter, Template, TemplateElement};
use serde::Serialize;

/// Block helpers whose body renders against a different context
const SCOPED_HELPERS: &[&str] = &["each", "with"];

/// Placeholder names referenced by a template, sorted and deduplicated
///
/// Names come from the compiled template, so comments and escaped
/// `\{{...}}` literals never count. Dotted paths such as `user.name` are
/// reported whole, as are the parameters of `{{#if}}`-style helpers. Bodies
/// of `each`/`with` blocks are skipped since their names are relative.
pub fn placeholders(template: &str) -> Result<BTreeSet<String>, TemplateError> {
    let compiled = Template::compile(template)?;
    Ok(template_placeholders(&compiled))
}

pub(crate) fn template_placeholders(template: &Template) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    collect_elements(&template.elements, &mut found);
    found
}

fn collect_elements(elements: &[TemplateElement], found: &mut BTreeSet<String>) {
    for element in elements {
        match element {
            TemplateElement::Expression(ht) | TemplateElement::HtmlExpression(ht) => {
                if ht.params.is_empty() && ht.hash.is_empty() {
                    collect_param(&ht.name, found);
                } else {
                    for param in ht.params.iter().chain(ht.hash.values()) {
                        collect_param(param, found);
                    }
                }
            }
            TemplateElement::HelperBlock(ht) => {
                for param in ht.params.iter().chain(ht.hash.values()) {
                    collect_param(param, found);
                }
                let scoped = ht.name.as_name().is_some_and(|name| SCOPED_HELPERS.contains(&name));
                if let Some(body) = ht.template.as_ref().filter(|_| !scoped) {
                    collect_elements(&body.elements, found);
                }
                if let Some(inverse) = &ht.inverse {
                    collect_elements(&inverse.elements, found);
                }
            }
            // raw text, comments, escapes, partials and decorators
            _ => {}
        }
    }
}

fn collect_param(param: &Parameter, found: &mut BTreeSet<String>) {
    match param {
        Parameter::Path(_) => {
            if let Some(name) = param.as_name().and_then(context_path) {
                found.insert(name.to_string());
            }
        }
        Parameter::Subexpression(sub) => collect_elements(std::slice::from_ref(&*sub.element), found),
        _ => {}
    }
}

/// Normalize `this.x`/`./x` to `x`; local (`@index`) and parent (`../x`) references are not variables
fn context_path(raw: &str) -> Option<&str> {
    let path = raw
        .strip_prefix("this.")
        .or_else(|| raw.strip_prefix("this/"))
        .or_else(|| raw.strip_prefix("./"))
        .unwrap_or(raw);
    if path.is_empty() || path == "this" || path.starts_with('@') || path.starts_with("..") {
        None
    } else {
        Some(path)
    }
}

/// Mapping from placeholder name to its text value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a value, returning the previous one if the name was already set
    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) -> Option<String> {
        self.0.insert(name.into(), value.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Names from `wanted` that have no value, in sorted order
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let mut missing: Vec<String> = wanted.into_iter().filter(|name| !self.contains(name)).cloned().collect();
        missing.sort();
        missing
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, value) in iter {
            vars.insert(name, value);
        }
        vars
    }
}
