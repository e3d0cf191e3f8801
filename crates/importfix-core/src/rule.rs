//! Rewrite rules: recognize an import statement shape and comment it out.
//!
//! A rule is a predicate plus a transform over the whole file text. Rules
//! never touch the filesystem, so they can be tested on plain strings and new
//! statement shapes can be added without touching the file-walking code.
//!
//! ## Matching
//!
//! Every `ImportCommentRule` is anchored at the start of a line with only
//! spaces or tabs before the statement. A line that has already been commented
//! out starts with `//` and can never match again, which makes the bulk pass
//! idempotent.

use std::borrow::Cow;
use std::fmt;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::FixError;
use crate::text::{byte_offset_to_line, comment_out, line_ending};

/// Note line written above every commented-out statement.
pub const DEFAULT_NOTE: &str = "// Module not yet implemented";

/// One statement rewritten by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    /// Name of the rule that matched.
    pub rule: String,
    /// 1-indexed line of the statement in the text the rule was applied to.
    pub line: u32,
}

/// A syntactic rewrite over a whole source file.
pub trait RewriteRule: fmt::Debug + Send + Sync {
    /// Stable rule name, used in reports and logs.
    fn name(&self) -> &str;

    /// Whether `apply` would change `text`.
    fn is_match(&self, text: &str) -> bool;

    /// Rewrite every match in `text`.
    ///
    /// Returns `Cow::Borrowed` and no hits when nothing matched.
    fn apply<'t>(&self, text: &'t str) -> (Cow<'t, str>, Vec<RuleHit>);
}

// ============================================================================
// Rule Descriptions
// ============================================================================

/// Serializable description of an import-commenting rule.
///
/// `statement` is a regular expression for the statement itself, without any
/// leading indentation or line anchor; both are added when the rule is
/// compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule name.
    pub name: String,
    /// Regex matching the statement to comment out.
    pub statement: String,
    /// Note line written above the statement (default: [`DEFAULT_NOTE`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RuleSpec {
    /// Create a rule description with the default note.
    pub fn new(name: impl Into<String>, statement: impl Into<String>) -> Self {
        RuleSpec {
            name: name.into(),
            statement: statement.into(),
            note: None,
        }
    }

    /// Compile into an executable rule.
    pub fn compile(&self) -> Result<ImportCommentRule, FixError> {
        ImportCommentRule::new(
            &self.name,
            &self.statement,
            self.note.as_deref().unwrap_or(DEFAULT_NOTE),
        )
    }
}

// ============================================================================
// ImportCommentRule
// ============================================================================

/// Comments out every statement matching a regex, preceded by a note line.
#[derive(Debug, Clone)]
pub struct ImportCommentRule {
    name: String,
    regex: Regex,
    note: String,
}

impl ImportCommentRule {
    /// Compile a rule from a statement pattern.
    pub fn new(name: &str, statement: &str, note: &str) -> Result<Self, FixError> {
        let pattern = format!(r"(?m)^(?P<indent>[ \t]*)(?P<stmt>{})", statement);
        let regex = Regex::new(&pattern).map_err(|e| FixError::InvalidRule {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(ImportCommentRule {
            name: name.to_string(),
            regex,
            note: note.to_string(),
        })
    }

    fn replacement(&self, caps: &Captures<'_>, eol: &str) -> String {
        let indent = caps.name("indent").map_or("", |m| m.as_str());
        let stmt = caps.name("stmt").map_or("", |m| m.as_str());
        format!("{}{}{}{}", indent, self.note, eol, comment_out(indent, stmt))
    }
}

impl RewriteRule for ImportCommentRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn apply<'t>(&self, text: &'t str) -> (Cow<'t, str>, Vec<RuleHit>) {
        let eol = line_ending(text);
        let mut hits = Vec::new();
        let rewritten = self.regex.replace_all(text, |caps: &Captures<'_>| {
            let start = caps.get(0).map_or(0, |m| m.start());
            hits.push(RuleHit {
                rule: self.name.clone(),
                line: byte_offset_to_line(text, start),
            });
            self.replacement(caps, eol)
        });
        (rewritten, hits)
    }
}

// ============================================================================
// Built-in Rules
// ============================================================================

/// Descriptions of the built-in rules, in application order.
///
/// The four shapes are mutually exclusive: a plain named import, a type-only
/// named import, and two single-symbol relative imports that reach into the
/// missing module's service and schema files from any directory depth.
pub fn default_rule_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(
            "exchanges-named-import",
            r#"import\s*\{[^}]+\}\s*from\s*['"]@/modules/exchanges['"];?"#,
        ),
        RuleSpec::new(
            "exchanges-type-import",
            r#"import\s+type\s*\{[^}]+\}\s*from\s*['"]@/modules/exchanges['"];?"#,
        ),
        RuleSpec::new(
            "exchange-service-import",
            r#"import\s*\{\s*ExchangeService\s*\}\s*from\s*['"]\.\.[^'"\n]*exchanges/services/exchange\.service['"];?"#,
        ),
        RuleSpec::new(
            "exchange-schema-import",
            r#"import\s*\{\s*exchangeConnections\s*\}\s*from\s*['"]\.\.[^'"\n]*exchanges/schema/exchanges\.schema['"];?"#,
        ),
    ]
}

/// Compile the built-in rules.
pub fn default_rules() -> Result<Vec<Box<dyn RewriteRule>>, FixError> {
    compile_rules(&default_rule_specs())
}

/// Compile a list of rule descriptions, preserving order.
pub fn compile_rules(specs: &[RuleSpec]) -> Result<Vec<Box<dyn RewriteRule>>, FixError> {
    specs
        .iter()
        .map(|spec| spec.compile().map(|rule| Box::new(rule) as Box<dyn RewriteRule>))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
