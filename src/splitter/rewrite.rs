//! Reference Rewriting
//!
//! Once a module lives in its own package, references to its own types can no
//! longer go through the monolithic `inputs.<Module>.` / `outputs.<Module>.` /
//! `enums.<Module>.` namespaces. This module holds the substitution rules that
//! turn those qualified references into local ones.
//!
//! Two targets share the same rule shapes:
//! - **Type slices** drop the qualification entirely (`inputs.Foo.Bar` -> `Bar`)
//!   and map enums onto the local `enums` alias.
//! - **Implementation files** keep a local alias (`inputs.Foo.Bar` ->
//!   `types.inputs.Bar`) because they consume the aggregated `types` module.
//!
//! # Precedence
//!
//! A version-qualified pattern (`inputs.Foo.v1.`) is a strict superstring of
//! the module-qualified one (`inputs.Foo.`). A [`RuleSet`] therefore always
//! orders its rules longest pattern first, whatever order they were supplied
//! in, so the more qualified rule consumes its matches before the shorter one
//! can leave a dangling `v1.` segment behind.
//!
//! # Token boundaries
//!
//! A pattern only matches where the preceding character is not part of an
//! identifier or member access (`[A-Za-z0-9_$.]`). `pulumi.inputs.Foo.` and
//! `myinputs.Foo.` are left untouched.

use std::borrow::Cow;

use super::names::Direction;

/// One indentation unit of the generated declaration files.
pub const INDENT: &str = "    ";

/// Alias under which implementation files see the aggregated types module.
pub const TYPES_ALIAS: &str = "types";

/// Namespace alias for enums in both the source tree and the split output.
pub const ENUMS_ALIAS: &str = "enums";

/// The scope a line belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scope<'a> {
    pub module: &'a str,
    pub submodule: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn module(module: &'a str) -> Self {
        Self {
            module,
            submodule: None,
        }
    }

    pub fn submodule(module: &'a str, submodule: &'a str) -> Self {
        Self {
            module,
            submodule: Some(submodule),
        }
    }

    /// `Module.` or `Module.vX.`, the qualification that follows a namespace alias.
    fn qualifier(&self) -> String {
        match self.submodule {
            Some(version) => format!("{}.{}.", self.module, version),
            None => format!("{}.", self.module),
        }
    }
}

/// A single `pattern -> replacement` substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteRule {
    pattern: String,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every boundary-aligned occurrence of the pattern.
    pub fn apply<'s>(&self, line: &'s str) -> Cow<'s, str> {
        if self.pattern.is_empty() || !line.contains(self.pattern.as_str()) {
            return Cow::Borrowed(line);
        }

        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        let mut changed = false;

        for (idx, matched) in line.match_indices(self.pattern.as_str()) {
            if !is_token_start(line[..idx].chars().next_back()) {
                continue;
            }
            out.push_str(&line[last..idx]);
            out.push_str(&self.replacement);
            last = idx + matched.len();
            changed = true;
        }

        if !changed {
            return Cow::Borrowed(line);
        }
        out.push_str(&line[last..]);
        Cow::Owned(out)
    }
}

fn is_token_start(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'),
    }
}

/// An ordered list of rules, applied longest pattern first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(mut rules: Vec<RewriteRule>) -> Self {
        // Stable sort keeps supplied order among equally long patterns.
        rules.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        Self { rules }
    }

    /// Rules for a line captured into a type slice of `direction`.
    pub fn for_type_slice(scope: Scope<'_>, direction: Direction) -> Self {
        let qualifier = scope.qualifier();
        Self::new(vec![
            RewriteRule::new(format!("{}.{}", direction.alias(), qualifier), ""),
            RewriteRule::new(
                format!("{}.{}", ENUMS_ALIAS, qualifier),
                format!("{}.", ENUMS_ALIAS),
            ),
        ])
    }

    /// Rules for an implementation file that imports the local `types` module.
    pub fn for_implementation(scope: Scope<'_>) -> Self {
        let qualifier = scope.qualifier();
        let rules = [
            Direction::Inputs.alias(),
            Direction::Outputs.alias(),
            ENUMS_ALIAS,
        ]
        .iter()
        .map(|alias| {
            RewriteRule::new(
                format!("{}.{}", alias, qualifier),
                format!("{}.{}.", TYPES_ALIAS, alias),
            )
        })
        .collect();
        Self::new(rules)
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Run every rule over `line` in precedence order.
    pub fn apply(&self, line: &str) -> String {
        let mut current = line.to_string();
        for rule in &self.rules {
            let next = match rule.apply(&current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            current = next;
        }
        current
    }
}

/// Remove exactly one leading indentation unit, if the line has one.
pub fn dedent(line: &str) -> &str {
    line.strip_prefix(INDENT).unwrap_or(line)
}

/// Rewrite one declaration line for its slice: dedent, then apply `rules`.
pub fn rewrite_declaration_line(line: &str, rules: &RuleSet) -> String {
    rules.apply(dedent(line))
}

/// Convenience form of [`rewrite_declaration_line`] that builds the rules.
pub fn rewrite_line(line: &str, scope: Scope<'_>, direction: Direction) -> String {
    rewrite_declaration_line(line, &RuleSet::for_type_slice(scope, direction))
}
