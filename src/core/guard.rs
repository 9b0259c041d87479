//! Guard conditions for gating contract transitions.
//!
//! Expressions are parsed once, when the contract is loaded, into a small
//! [`Condition`] AST. Evaluation is pure and total: unknown fields,
//! unregistered predicates and malformed expressions all evaluate to `false`.
//!
//! The built-in grammar is deliberately minimal:
//!
//! ```text
//! <field> == <literal>
//! <field> != <literal>
//! <predicate>(<arg>, ...)
//! ```
//!
//! Richer operators are added by registering named predicates in a
//! [`PredicateRegistry`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Runtime context a guard is evaluated against.
pub type Context = serde_json::Map<String, Value>;

/// Literal on the right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Literal {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        for quote in ['"', '\''] {
            if raw.starts_with(quote) {
                if raw.len() >= 2 && raw.ends_with(quote) {
                    return Some(Self::String(raw[1..raw.len() - 1].to_string()));
                }
                return None;
            }
        }

        match raw {
            "true" => return Some(Self::Bool(true)),
            "false" => return Some(Self::Bool(false)),
            "null" => return Some(Self::Null),
            _ => {}
        }

        if let Ok(i) = raw.parse::<i64>() {
            return Some(Self::Integer(i));
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Some(Self::Float(f));
        }

        // Bare words compare as strings.
        if raw.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self::String(raw.to_string()))
    }

    /// Whether a context value equals this literal.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(s), Value::String(v)) => s == v,
            (Self::Integer(i), Value::Number(n)) => n.as_f64() == Some(*i as f64),
            (Self::Float(f), Value::Number(n)) => n.as_f64() == Some(*f),
            (Self::Bool(b), Value::Bool(v)) => b == v,
            (Self::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// Parsed guard expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    EqualityCheck { field: String, literal: Literal },
    NotEqualCheck { field: String, literal: Literal },
    Predicate { name: String, args: Vec<String> },
    Malformed { expression: String },
}

fn is_field_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Condition {
    /// Parse an expression. Never fails: unparseable input becomes
    /// [`Condition::Malformed`].
    pub fn parse(expression: &str) -> Self {
        let expr = expression.trim();
        let malformed = || Self::Malformed {
            expression: expression.to_string(),
        };

        let eq = expr.find("==");
        let ne = expr.find("!=");
        let (pos, negated) = match (eq, ne) {
            (Some(e), Some(n)) if n < e => (n, true),
            (Some(e), _) => (e, false),
            (None, Some(n)) => (n, true),
            (None, None) => return Self::parse_predicate(expr).unwrap_or_else(malformed),
        };

        let field = expr[..pos].trim();
        let rhs = &expr[pos + 2..];
        if !is_field_path(field) {
            return malformed();
        }
        let Some(literal) = Literal::parse(rhs) else {
            return malformed();
        };

        let field = field.to_string();
        if negated {
            Self::NotEqualCheck { field, literal }
        } else {
            Self::EqualityCheck { field, literal }
        }
    }

    fn parse_predicate(expr: &str) -> Option<Self> {
        let open = expr.find('(')?;
        if !expr.ends_with(')') {
            return None;
        }
        let name = expr[..open].trim();
        if !is_identifier(name) {
            return None;
        }
        let inner = expr[open + 1..expr.len() - 1].trim();
        let args = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|a| a.trim().to_string()).collect()
        };
        if args.iter().any(String::is_empty) {
            return None;
        }
        Some(Self::Predicate {
            name: name.to_string(),
            args,
        })
    }

    /// Evaluate against a context. Pure and total.
    pub fn evaluate(&self, context: &Context, registry: &PredicateRegistry) -> bool {
        match self {
            Self::EqualityCheck { field, literal } => {
                resolve_field(context, field).is_some_and(|v| literal.matches(v))
            }
            Self::NotEqualCheck { field, literal } => {
                resolve_field(context, field).is_some_and(|v| !literal.matches(v))
            }
            Self::Predicate { name, args } => registry
                .get(name)
                .is_some_and(|predicate| predicate(args.as_slice(), context)),
            Self::Malformed { .. } => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Look up a field, first as a literal key, then as a dotted path into
/// nested objects.
pub fn resolve_field<'a>(context: &'a Context, path: &str) -> Option<&'a Value> {
    if let Some(value) = context.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Named predicate: receives the raw argument list and the context.
pub type PredicateFn = Arc<dyn Fn(&[String], &Context) -> bool + Send + Sync>;

/// Registry of named predicates reachable from `name(args)` expressions.
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, PredicateFn>,
}

impl PredicateRegistry {
    /// An empty registry; every predicate expression evaluates to `false`.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Registry with `exists(field)` and `is_true(field)`.
    pub fn with_builtins() -> Self {
        Self::empty()
            .with("exists", |args, ctx| {
                !args.is_empty() && args.iter().all(|a| resolve_field(ctx, a).is_some())
            })
            .with("is_true", |args, ctx| {
                args.len() == 1 && matches!(resolve_field(ctx, &args[0]), Some(Value::Bool(true)))
            })
    }

    pub fn with<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&[String], &Context) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Register or replace a named predicate.
    pub fn register<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&[String], &Context) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
    }

    pub fn get(&self, name: &str) -> Option<&PredicateFn> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

/// Evaluates `(expression, context)` pairs.
#[derive(Clone, Debug, Default)]
pub struct ConditionEvaluator {
    registry: PredicateRegistry,
}

impl ConditionEvaluator {
    pub fn new(registry: PredicateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Parse and evaluate a raw expression.
    pub fn evaluate(&self, expression: &str, context: &Context) -> bool {
        Condition::parse(expression).evaluate(context, &self.registry)
    }

    /// Evaluate an already parsed condition.
    pub fn evaluate_condition(&self, condition: &Condition, context: &Context) -> bool {
        condition.evaluate(context, &self.registry)
    }
}
