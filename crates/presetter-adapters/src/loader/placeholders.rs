//! `{{...}}` placeholders and `if` expressions in manifests.
//!
//! Both compile to deferred [`ContextValue`]s, so they are evaluated against
//! the running preset right before its actions execute.
//!
//! | Reference       | Value                                  |
//! |-----------------|----------------------------------------|
//! | `name`          | preset name                            |
//! | `target`        | target directory                       |
//! | `args`          | forwarded arguments, space separated   |
//! | `options.<key>` | command-line option                    |
//! | `prompts.<key>` | prompt answer                          |
//! | `git.<key>`     | `git config` value, e.g. `git.user.name` |

use presetter_core::domain::{ContextValue, DomainError, Preset, truthy};
use serde_json::Value;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Reference(String),
}

fn parse(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_owned()));
        }
        segments.push(Segment::Reference(after[..end].trim().to_owned()));
        rest = &after[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_owned()));
    }
    segments
}

fn has_references(segments: &[Segment]) -> bool {
    segments.iter().any(|s| matches!(s, Segment::Reference(_)))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Current value of a reference; unknown references render empty.
fn lookup(preset: &Preset, reference: &str) -> String {
    match reference {
        "name" => preset.name().unwrap_or_default().to_owned(),
        "target" => preset.target_directory().display().to_string(),
        "args" => preset.args().join(" "),
        _ => {
            if let Some(key) = reference.strip_prefix("options.") {
                preset.options().get(key).as_ref().map(value_to_string).unwrap_or_default()
            } else if let Some(key) = reference.strip_prefix("prompts.") {
                preset.prompt(key).map(value_to_string).unwrap_or_default()
            } else if let Some(key) = reference.strip_prefix("git.") {
                preset.git().config_value(key).unwrap_or_default().to_owned()
            } else {
                String::new()
            }
        }
    }
}

fn render(segments: &[Segment], preset: &Preset) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Reference(reference) => lookup(preset, reference),
        })
        .collect()
}

/// A string that may contain placeholders.
pub fn text(raw: &str) -> ContextValue<String> {
    let segments = parse(raw);
    if !has_references(&segments) {
        return ContextValue::Literal(raw.to_owned());
    }
    ContextValue::deferred(move |preset: &Preset| render(&segments, preset))
}

/// A list of strings; an entry that is exactly `{{args}}` expands to every
/// forwarded argument.
pub fn list(raw: Vec<String>) -> ContextValue<Vec<String>> {
    let entries: Vec<Vec<Segment>> = raw.iter().map(|r| parse(r)).collect();
    if !entries.iter().any(|e| has_references(e)) {
        return ContextValue::Literal(raw);
    }

    ContextValue::deferred(move |preset: &Preset| {
        let mut values = Vec::new();
        for segments in &entries {
            match segments.as_slice() {
                [Segment::Reference(r)] if r == "args" => values.extend(preset.args().iter().cloned()),
                _ => values.push(render(segments, preset)),
            }
        }
        values
    })
}

/// An `if` expression: `options.<key>`, `prompts.<key>`, `interactive`,
/// `true`/`false`, optionally negated with a leading `!`.
pub fn condition(raw: &str) -> Result<ContextValue<bool>, DomainError> {
    let expression = raw.trim();
    let (negated, reference) = match expression.strip_prefix('!') {
        Some(rest) => (true, rest.trim().to_owned()),
        None => (false, expression.to_owned()),
    };

    let literal = match reference.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    };
    if let Some(value) = literal {
        return Ok(ContextValue::Literal(value != negated));
    }

    let known = reference == "interactive"
        || ["options.", "prompts."]
            .iter()
            .any(|prefix| reference.strip_prefix(prefix).is_some_and(|k| !k.is_empty()));
    if !known {
        return Err(DomainError::InvalidAction(format!(
            "unsupported condition '{raw}'"
        )));
    }

    Ok(ContextValue::deferred(move |preset: &Preset| {
        let value = if reference == "interactive" {
            preset.is_interactive()
        } else if let Some(key) = reference.strip_prefix("options.") {
            preset.options().is_enabled(key)
        } else if let Some(key) = reference.strip_prefix("prompts.") {
            preset.prompt(key).is_some_and(truthy)
        } else {
            false
        };
        value != negated
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use presetter_core::domain::{CommandLineOptions, GitContext, RunBinding};
    use serde_json::json;

    use super::*;

    fn preset() -> Preset {
        let mut options = CommandLineOptions::default();
        options.set("auth", json!(true));
        options.set("stack", json!("vue"));

        let mut preset = Preset::bound(RunBinding {
            target_directory: "/work/app".into(),
            args: vec!["--ts".into(), "--ssr".into()],
            options,
            git: GitContext::new(
                BTreeMap::from([("user.name".to_string(), "Ada".to_string())]),
                None,
            ),
            ..RunBinding::default()
        });
        preset.set_name("starter");
        preset
    }

    #[test]
    fn plain_strings_stay_literal() {
        assert!(!text("composer").is_deferred());
        assert!(!text("{{unclosed").is_deferred());
        assert!(!list(vec!["a".into()]).is_deferred());
    }

    #[test]
    fn renders_every_reference_kind() {
        let value = text("{{ name }} for {{git.user.name}} in {{target}} ({{options.stack}}, {{args}})");
        assert_eq!(
            value.resolve(&preset()),
            "starter for Ada in /work/app (vue, --ts --ssr)"
        );
    }

    #[test]
    fn unknown_reference_renders_empty() {
        assert_eq!(text("[{{options.missing}}]").resolve(&preset()), "[]");
    }

    #[test]
    fn args_entry_expands_in_lists() {
        let value = list(vec!["install".into(), "{{args}}".into(), "--{{options.stack}}".into()]);
        assert_eq!(
            value.resolve(&preset()),
            vec!["install", "--ts", "--ssr", "--vue"]
        );
    }

    #[test]
    fn conditions_read_options_and_prompts() {
        let mut preset = preset();
        preset.answer("docker", json!("yes")).unwrap();

        assert!(condition("options.auth").unwrap().resolve(&preset));
        assert!(!condition("!options.auth").unwrap().resolve(&preset));
        assert!(!condition("options.missing").unwrap().resolve(&preset));
        assert!(condition("prompts.docker").unwrap().resolve(&preset));
        assert!(!condition("! true").unwrap().resolve(&preset));
    }

    #[test]
    fn interactive_respects_disabled_interaction() {
        let preset = Preset::bound(RunBinding {
            options: CommandLineOptions {
                interaction: Some(false),
                ..Default::default()
            },
            ..RunBinding::default()
        });
        assert!(!condition("interactive").unwrap().resolve(&preset));
    }

    #[test]
    fn unsupported_condition_is_rejected() {
        assert!(condition("env.HOME").is_err());
        assert!(condition("options.").is_err());
    }
}
