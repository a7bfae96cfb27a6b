// Placeholder lookups used to resolve plugin config templates against a resource

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inventory::warn_missing_property;
use crate::parser::Value;

static INTERPOLATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*)\s*\}\}").unwrap()
});

/// Produces the value substituted for one template placeholder
pub trait PlaceholderLookup {
    fn lookup(&self, name: &str, resource: &Value, placeholder: &str) -> Value;
}

impl<F> PlaceholderLookup for F
where
    F: Fn(&str, &Value, &str) -> Value,
{
    fn lookup(&self, name: &str, resource: &Value, placeholder: &str) -> Value {
        self(name, resource, placeholder)
    }
}

/// Treats the placeholder as a dotted path into the resource
///
/// Usage: `user: ssh_config.User` resolves to the resource's SSH user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourcePathLookup;

impl PlaceholderLookup for ResourcePathLookup {
    fn lookup(&self, name: &str, resource: &Value, placeholder: &str) -> Value {
        match resource.dig(placeholder) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                warn_missing_property(name, placeholder);
                Value::Null
            }
        }
    }
}

/// Replaces `{{ path }}` markers inside the placeholder string
///
/// A string that is exactly one marker keeps the looked-up value's type;
/// otherwise every marker is rendered into the surrounding text and missing
/// paths render as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolationLookup;

impl PlaceholderLookup for InterpolationLookup {
    fn lookup(&self, name: &str, resource: &Value, placeholder: &str) -> Value {
        if let Some(caps) = INTERPOLATION_RE.captures(placeholder) {
            if caps[0].len() == placeholder.trim().len() {
                return ResourcePathLookup.lookup(name, resource, &caps[1]);
            }
        }

        let rendered = INTERPOLATION_RE.replace_all(placeholder, |caps: &regex::Captures| {
            match resource.dig(&caps[1]) {
                Some(value) if !value.is_null() => value.to_string(),
                _ => {
                    warn_missing_property(name, &caps[1]);
                    String::new()
                }
            }
        });

        Value::String(rendered.into_owned())
    }
}

/// Resolve every string leaf of `template` through `lookup`.
///
/// Keys, nesting and non-string leaves are returned unchanged.
pub fn resolve_config(
    name: &str,
    resource: &Value,
    template: &Value,
    lookup: &dyn PlaceholderLookup,
) -> Value {
    template.walk_vals(&mut |value| match value {
        Value::String(placeholder) => lookup.lookup(name, resource, placeholder),
        other => other.clone(),
    })
}
