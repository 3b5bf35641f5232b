//! Override rules: rename, remove, scope, trait.
//!
//! Each rule kind has a compact textual syntax parsed by a small
//! hand-written scanner. Unusable rules parse to `None` and the caller
//! decides whether to log them; applying rules never fails.
//!
//! Syntax:
//! - rename: `key:field>table|field` (everything after `key` optional)
//! - remove: `field>table|field` (at least one component required)
//! - scope:  `name` or `key:field op value` (`op` one of `= != <> < > <= >=`)
//! - trait:  `Name:path::to::Item`

use crate::classify::{RelationKind, Relationship};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub key: String,
    pub source_field: Option<String>,
    pub target_table: Option<String>,
    pub target_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRule {
    pub source_field: Option<String>,
    pub target_table: Option<String>,
    pub target_field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ScopeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "=" | "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeValue {
    /// Render-ready literal: numeric as-is, text already quoted.
    Literal(String),
    /// A parameter of the generated scope, without the `$` sigil.
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRule {
    pub name: String,
    pub field: String,
    pub op: ScopeOp,
    pub value: ScopeValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitRule {
    /// Derive name added to the model.
    pub name: String,
    /// Import path emitted as a `use` line.
    pub path: String,
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn take_ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(ident)
    }

    fn take_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    /// Take a run of characters from the given set.
    fn take_while(&mut self, set: &[char]) -> &'a str {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !set.contains(&c))
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        run
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.rest.is_empty()
    }
}

/// Parse the shared `field>table|field` triple. Every part is optional.
fn parse_triple(sc: &mut Scanner) -> (Option<String>, Option<String>, Option<String>) {
    let source_field = sc.take_ident().map(str::to_string);
    let target_table = if sc.take_char('>') {
        sc.take_ident().map(str::to_string)
    } else {
        None
    };
    let target_field = if sc.take_char('|') {
        sc.take_ident().map(str::to_string)
    } else {
        None
    };
    (source_field, target_table, target_field)
}

pub fn parse_rename(input: &str) -> Option<RenameRule> {
    let mut sc = Scanner::new(input);
    let key = sc.take_ident()?.to_string();
    if !sc.take_char(':') {
        return None;
    }

    let (source_field, target_table, target_field) = parse_triple(&mut sc);
    if !sc.at_end() {
        return None;
    }
    if source_field.is_none() && target_table.is_none() && target_field.is_none() {
        return None;
    }

    Some(RenameRule {
        key,
        source_field,
        target_table,
        target_field,
    })
}

pub fn parse_remove(input: &str) -> Option<RemoveRule> {
    let mut sc = Scanner::new(input);
    let (source_field, target_table, target_field) = parse_triple(&mut sc);
    if !sc.at_end() {
        return None;
    }
    if source_field.is_none() && target_table.is_none() && target_field.is_none() {
        return None;
    }

    Some(RemoveRule {
        source_field,
        target_table,
        target_field,
    })
}

pub fn parse_scope(input: &str) -> Option<ScopeRule> {
    let mut sc = Scanner::new(input);

    let first = sc.take_ident()?.to_string();
    if sc.at_end() {
        // Bare identifier: `active` means `active = $active`.
        return Some(ScopeRule {
            field: first.clone(),
            value: ScopeValue::Param(first.clone()),
            name: first,
            op: ScopeOp::Eq,
        });
    }

    let (name, field) = if sc.take_char(':') {
        let field = sc.take_ident().map(str::to_string);
        (first.clone(), field.unwrap_or(first))
    } else {
        (first.clone(), first)
    };

    let op = ScopeOp::parse(sc.take_while(&['<', '>', '=', '!']))?;

    sc.skip_ws();
    let raw_value = sc.rest.trim();
    let value = if raw_value.is_empty() {
        ScopeValue::Param(field.clone())
    } else {
        parse_scope_value(raw_value)?
    };

    Some(ScopeRule {
        name,
        field,
        op,
        value,
    })
}

fn parse_scope_value(raw: &str) -> Option<ScopeValue> {
    if let Some(param) = raw.strip_prefix('$') {
        if param.is_empty() || !param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        return Some(ScopeValue::Param(param.to_string()));
    }

    if raw.parse::<f64>().is_ok() {
        return Some(ScopeValue::Literal(raw.to_string()));
    }

    // Quoted strings pass through; bare words get quoted.
    let quoted = (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
        || (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2);
    if quoted {
        Some(ScopeValue::Literal(raw.to_string()))
    } else if raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Some(ScopeValue::Literal(format!("'{raw}'")))
    } else {
        None
    }
}

pub fn parse_trait(input: &str) -> Option<TraitRule> {
    let (name, path) = input.split_once(':')?;
    let name = name.trim();
    let path = path.trim();
    if name.is_empty() || path.is_empty() {
        return None;
    }

    Some(TraitRule {
        name: name.to_string(),
        path: path.to_string(),
    })
}

/// Structural match of the `field>table|field` triple against a relationship.
///
/// The table component always matches against the relationship table. For
/// belongs-to-many there is no source key: the field component matches either
/// pivot key. For the other kinds the source field matches `other_key` and
/// the target field matches `foreign_key`.
fn triple_matches(
    rel: &Relationship,
    source_field: Option<&str>,
    target_table: Option<&str>,
    target_field: Option<&str>,
) -> bool {
    if let Some(table) = target_table {
        if table != rel.table {
            return false;
        }
    }

    if rel.kind == RelationKind::BelongsToMany {
        if let Some(field) = target_field {
            if field != rel.foreign_key && field != rel.other_key {
                return false;
            }
        }
    } else {
        if let Some(field) = source_field {
            if field != rel.other_key {
                return false;
            }
        }
        if let Some(field) = target_field {
            if field != rel.foreign_key {
                return false;
            }
        }
    }

    true
}

impl RenameRule {
    pub fn matches(&self, rel: &Relationship) -> bool {
        triple_matches(
            rel,
            self.source_field.as_deref(),
            self.target_table.as_deref(),
            self.target_field.as_deref(),
        )
    }
}

impl RemoveRule {
    pub fn matches(&self, rel: &Relationship) -> bool {
        triple_matches(
            rel,
            self.source_field.as_deref(),
            self.target_table.as_deref(),
            self.target_field.as_deref(),
        )
    }
}

/// Apply rename rules to every relationship; the first matching rule wins.
pub fn apply_renames(relations: &mut [Relationship], rules: &[RenameRule]) {
    for rel in relations {
        if let Some(rule) = rules.iter().find(|r| r.matches(rel)) {
            rel.name = rule.key.clone();
        }
    }
}

/// Whether any remove rule matches the relationship.
pub fn should_remove(rel: &Relationship, rules: &[RemoveRule]) -> bool {
    rules.iter().any(|r| r.matches(rel))
}
