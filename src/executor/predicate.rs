use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use crate::types::{
    error::{DatabaseError, Result},
    tuple::Tuple,
    value::Value,
};

/// Comparison operators for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOp {
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        let ordering = left.compare(right);
        match self {
            ComparisonOp::Equal => ordering == Some(Ordering::Equal),
            ComparisonOp::NotEqual => ordering != Some(Ordering::Equal),
            ComparisonOp::LessThan => ordering == Some(Ordering::Less),
            ComparisonOp::LessThanOrEqual => ordering.is_some_and(|o| o.is_le()),
            ComparisonOp::GreaterThan => ordering == Some(Ordering::Greater),
            ComparisonOp::GreaterThanOrEqual => ordering.is_some_and(|o| o.is_ge()),
        }
    }

    /// Whether any value in `[lo, hi]` could satisfy `value op rhs`.
    fn satisfiable_within(&self, lo: &Value, hi: &Value, rhs: &Value) -> bool {
        match self {
            ComparisonOp::Equal => {
                ComparisonOp::LessThanOrEqual.apply(lo, rhs)
                    && ComparisonOp::GreaterThanOrEqual.apply(hi, rhs)
            }
            ComparisonOp::NotEqual => !(lo == rhs && hi == rhs),
            ComparisonOp::LessThan | ComparisonOp::LessThanOrEqual => self.apply(lo, rhs),
            ComparisonOp::GreaterThan | ComparisonOp::GreaterThanOrEqual => self.apply(hi, rhs),
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "=" => Ok(ComparisonOp::Equal),
            "!=" => Ok(ComparisonOp::NotEqual),
            "<" => Ok(ComparisonOp::LessThan),
            "<=" => Ok(ComparisonOp::LessThanOrEqual),
            ">" => Ok(ComparisonOp::GreaterThan),
            ">=" => Ok(ComparisonOp::GreaterThanOrEqual),
            other => Err(DatabaseError::query(format!("Invalid operator: {other}"))),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        };
        f.write_str(symbol)
    }
}

/// Logical operators for combining predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Xor,
}

impl LogicalOp {
    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            LogicalOp::And => left && right,
            LogicalOp::Or => left || right,
            LogicalOp::Xor => left ^ right,
        }
    }
}

impl FromStr for LogicalOp {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(LogicalOp::And),
            "or" => Ok(LogicalOp::Or),
            "xor" => Ok(LogicalOp::Xor),
            other => Err(DatabaseError::query(format!(
                "Invalid logical operator: {other}"
            ))),
        }
    }
}

/// One `column op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlTerm {
    pub table_name: String,
    pub column_name: String,
    pub op: ComparisonOp,
    pub value: Value,
}

impl SqlTerm {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        op: ComparisonOp,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a term from a textual operator such as `">="`.
    pub fn parse(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self::new(table_name, column_name, op.parse()?, value))
    }

    pub fn evaluate(&self, tuple: &Tuple) -> Result<bool> {
        let actual = tuple
            .get_value(&self.column_name)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: self.column_name.clone(),
                table: self.table_name.clone(),
            })?;
        Ok(self.op.apply(actual, &self.value))
    }
}

/// Terms folded left to right with one connector between each pair:
/// `((t0 c0 t1) c1 t2) ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    terms: Vec<SqlTerm>,
    connectors: Vec<LogicalOp>,
}

impl Predicate {
    pub fn new(terms: Vec<SqlTerm>, connectors: Vec<LogicalOp>) -> Result<Self> {
        if terms.is_empty() {
            return Err(DatabaseError::query("A predicate needs at least one term"));
        }
        if connectors.len() != terms.len() - 1 {
            return Err(DatabaseError::query(format!(
                "{} terms need {} connectors, got {}",
                terms.len(),
                terms.len() - 1,
                connectors.len()
            )));
        }
        Ok(Self { terms, connectors })
    }

    /// Parse textual connectors (`"AND"`, `"or"`, `"Xor"`).
    pub fn parse(terms: Vec<SqlTerm>, connectors: &[&str]) -> Result<Self> {
        let connectors = connectors
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<LogicalOp>>>()?;
        Self::new(terms, connectors)
    }

    /// A conjunction of equality terms.
    pub fn all_equal(table_name: &str, criteria: &BTreeMap<String, Value>) -> Result<Self> {
        let terms = criteria
            .iter()
            .map(|(column, value)| SqlTerm::new(table_name, column, ComparisonOp::Equal, value.clone()))
            .collect::<Vec<_>>();
        let connectors = vec![LogicalOp::And; terms.len().saturating_sub(1)];
        Self::new(terms, connectors)
    }

    pub fn terms(&self) -> &[SqlTerm] {
        &self.terms
    }

    pub fn connectors(&self) -> &[LogicalOp] {
        &self.connectors
    }

    /// Referenced column names, deduplicated, in first-use order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for term in &self.terms {
            if !columns.contains(&term.column_name) {
                columns.push(term.column_name.clone());
            }
        }
        columns
    }

    pub fn evaluate(&self, tuple: &Tuple) -> Result<bool> {
        let matches = self
            .terms
            .iter()
            .map(|term| term.evaluate(tuple))
            .collect::<Result<Vec<bool>>>()?;
        Ok(self.fold(&matches))
    }

    fn fold(&self, matches: &[bool]) -> bool {
        let mut result = matches[0];
        for (op, next) in self.connectors.iter().zip(&matches[1..]) {
            result = op.apply(result, *next);
        }
        result
    }

    /// Conservative page-level check used for index pruning. `bounds` gives
    /// the known [min, max] of a column on the page; terms over columns it
    /// does not know are treated as possibly true and possibly false.
    /// Returns false only when no tuple of the page can satisfy the predicate.
    pub fn might_match<'a, F>(&self, bounds: F) -> bool
    where
        F: Fn(&str) -> Option<&'a (Value, Value)>,
    {
        let outcomes = self.terms.iter().map(|term| {
            let can_be_true = match bounds(&term.column_name) {
                Some((lo, hi)) => term.op.satisfiable_within(lo, hi, &term.value),
                None => true,
            };
            Outcomes {
                can_be_true,
                can_be_false: true,
            }
        });
        let mut outcomes = outcomes.collect::<Vec<_>>().into_iter();
        let Some(mut acc) = outcomes.next() else {
            return true;
        };
        for (op, next) in self.connectors.iter().zip(outcomes) {
            acc = acc.combine(*op, next);
        }
        acc.can_be_true
    }
}

/// The set of boolean results a term may produce across a page.
#[derive(Debug, Clone, Copy)]
struct Outcomes {
    can_be_true: bool,
    can_be_false: bool,
}

impl Outcomes {
    fn values(self) -> impl Iterator<Item = bool> {
        [(self.can_be_false, false), (self.can_be_true, true)]
            .into_iter()
            .filter_map(|(possible, value)| possible.then_some(value))
    }

    fn combine(self, op: LogicalOp, other: Outcomes) -> Outcomes {
        let mut result = Outcomes {
            can_be_true: false,
            can_be_false: false,
        };
        for left in self.values() {
            for right in other.values() {
                if op.apply(left, right) {
                    result.can_be_true = true;
                } else {
                    result.can_be_false = true;
                }
            }
        }
        result
    }
}
