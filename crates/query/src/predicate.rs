//! Filter expression parsing and evaluation
//!
//! An expression has the form `<path> <op> '<literal>'`, e.g.
//! `brand.name == 'Ford'`. The path is a dot-separated selector into the
//! record's JSON document; the literal is compared as a string against
//! the selected value after scalar normalization.
//!
//! Normalization renders every scalar as a string before comparing:
//! integers in base 10, floats with a fixed 6-digit fraction, booleans as
//! `true`/`false`, JSON null as `null`. Trading numeric precision for a
//! single string comparator is deliberate; the rendering must stay exactly
//! stable for query compatibility.

use serde_json::Value;

use crate::error::{QueryError, Result};

/// Comparison operators recognized in filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
}

impl Operator {
    const ALL: [Operator; 2] = [Operator::Equals, Operator::NotEquals];

    /// The operator's token as it appears in an expression
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
        }
    }

    fn apply(self, value: &str, reference: &str) -> bool {
        match self {
            Operator::Equals => value == reference,
            Operator::NotEquals => value != reference,
        }
    }
}

/// A parsed filter expression: path, operator, reference literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    path: String,
    operator: Operator,
    reference: String,
}

impl Predicate {
    /// Parse an expression of the form `<path> <op> '<literal>'`.
    ///
    /// Splits on the earliest recognized operator token, so an operator
    /// appearing inside the literal does not win. The left side is the
    /// path; the right side loses one leading and one trailing character
    /// (the quote convention for literals).
    pub fn parse(expression: &str) -> Result<Self> {
        let (operator, at) = Operator::ALL
            .iter()
            .filter_map(|op| expression.find(op.token()).map(|at| (*op, at)))
            .min_by_key(|&(_, at)| at)
            .ok_or_else(|| {
                QueryError::Parse(format!("no recognized operator in {expression:?}"))
            })?;

        let path = expression[..at].trim();
        if path.is_empty() {
            return Err(QueryError::Parse(format!(
                "missing path in {expression:?}"
            )));
        }

        let literal = expression[at + operator.token().len()..].trim();
        if literal.chars().count() < 2 {
            return Err(QueryError::Parse(format!(
                "missing quoted literal in {expression:?}"
            )));
        }
        let mut chars = literal.chars();
        chars.next();
        chars.next_back();

        Ok(Self {
            path: path.to_string(),
            operator,
            reference: chars.as_str().to_string(),
        })
    }

    /// Selector path of the expression
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Comparison operator of the expression
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Reference literal the selected value is compared against
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Evaluate the predicate against one record.
    ///
    /// A path that resolves to nothing, or to a non-scalar, never
    /// satisfies the comparison, regardless of operator. Fails with
    /// [`QueryError::Eval`] only when the record is not valid JSON.
    pub fn matches(&self, record: &[u8]) -> Result<bool> {
        let doc: Value =
            serde_json::from_slice(record).map_err(|e| QueryError::Eval(e.to_string()))?;

        let Some(value) = resolve_path(&doc, &self.path).and_then(normalize_scalar) else {
            return Ok(false);
        };

        Ok(self.operator.apply(&value, &self.reference))
    }
}

/// Walk a dot-separated path into a JSON document.
///
/// Numeric segments index into arrays. A leading `$.` is tolerated.
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut current = root;
    for segment in path.split('.') {
        current = match segment.parse::<usize>() {
            Ok(i) => current.get(i)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

/// Render a scalar JSON value as its comparison string.
///
/// Arrays and objects normalize to `None` and are treated like a path
/// that resolved to nothing.
fn normalize_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| format!("{f:.6}"))
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
#[path = "predicate_test.rs"]
mod tests;
