//! Expressions, aggregates, and their evaluation.
//!
//! Expressions appear in rule guards, computed conclusion terms, and
//! aggregate arguments. An [`Evaluator`] turns them into [`Value`]s against
//! a token's bindings; [`StandardEvaluator`] is the built-in one.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;

use quadrille_foundation::{Error, ErrorKind, Node, Numeric, Result, Value, ValueType};

use crate::pattern::Variable;
use crate::token::Bindings;

// =============================================================================
// Expression
// =============================================================================

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOp {
    /// Boolean negation.
    Not,
    /// Arithmetic negation.
    Negate,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// Boolean conjunction (short-circuiting).
    And,
    /// Boolean disjunction (short-circuiting).
    Or,
}

/// An evaluable expression.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression {
    /// The node bound to a variable.
    Variable(Variable),
    /// A constant node.
    Constant(Node),
    /// True iff the variable is bound.
    Bound(Variable),
    /// The string form of a value.
    Str(Box<Expression>),
    /// Concatenation of string forms.
    Concat(Vec<Expression>),
    /// A unary operation.
    Unary(UnaryOp, Box<Expression>),
    /// A binary operation.
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// A variable reference.
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Variable::new(name))
    }

    /// A constant.
    #[must_use]
    pub fn constant(node: Node) -> Self {
        Self::Constant(node)
    }

    /// An integer constant.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Constant(Value::Integer(value).to_node())
    }

    /// A boolean negation.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Unary(UnaryOp::Not, Box::new(inner))
    }

    /// A binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Collects every variable this expression reads.
    pub fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            Self::Variable(v) | Self::Bound(v) => {
                out.insert(v.clone());
            }
            Self::Constant(_) => {}
            Self::Str(inner) | Self::Unary(_, inner) => inner.collect_variables(out),
            Self::Concat(parts) => {
                for part in parts {
                    part.collect_variables(out);
                }
            }
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }

    /// Returns every variable this expression reads.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{v}"),
            Self::Constant(n) => write!(f, "{n}"),
            Self::Bound(v) => write!(f, "bound({v})"),
            Self::Str(inner) => write!(f, "str({inner:?})"),
            Self::Concat(parts) => f.debug_tuple("concat").field(parts).finish(),
            Self::Unary(op, inner) => write!(f, "({op:?} {inner:?})"),
            Self::Binary(op, lhs, rhs) => write!(f, "({op:?} {lhs:?} {rhs:?})"),
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Aggregate functions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AggregateFunction {
    /// Number of members (or of successfully evaluated arguments).
    Count,
    /// Numeric sum.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Arithmetic mean, as a decimal.
    Avg,
    /// String forms joined by a separator.
    GroupConcat {
        /// Text placed between consecutive values.
        separator: String,
    },
}

/// One aggregate computation over a group.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Aggregate {
    /// The function applied.
    pub function: AggregateFunction,
    /// Evaluated per member. `None` only makes sense for `Count`.
    pub argument: Option<Expression>,
    /// Whether duplicate argument values count once.
    pub distinct: bool,
}

impl Aggregate {
    fn of(function: AggregateFunction, argument: Option<Expression>) -> Self {
        Self {
            function,
            argument,
            distinct: false,
        }
    }

    /// Counts group members.
    #[must_use]
    pub fn count() -> Self {
        Self::of(AggregateFunction::Count, None)
    }

    /// Counts members for which the argument evaluates.
    #[must_use]
    pub fn count_of(argument: Expression) -> Self {
        Self::of(AggregateFunction::Count, Some(argument))
    }

    /// Sums the argument.
    #[must_use]
    pub fn sum(argument: Expression) -> Self {
        Self::of(AggregateFunction::Sum, Some(argument))
    }

    /// Minimum of the argument.
    #[must_use]
    pub fn min(argument: Expression) -> Self {
        Self::of(AggregateFunction::Min, Some(argument))
    }

    /// Maximum of the argument.
    #[must_use]
    pub fn max(argument: Expression) -> Self {
        Self::of(AggregateFunction::Max, Some(argument))
    }

    /// Mean of the argument.
    #[must_use]
    pub fn avg(argument: Expression) -> Self {
        Self::of(AggregateFunction::Avg, Some(argument))
    }

    /// Joins the argument's string forms.
    #[must_use]
    pub fn group_concat(argument: Expression, separator: &str) -> Self {
        Self::of(
            AggregateFunction::GroupConcat {
                separator: separator.to_string(),
            },
            Some(argument),
        )
    }

    /// Counts each distinct argument value once.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// Grouping variables plus the aggregates bound for each group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Aggregation {
    /// Variables whose values identify a group.
    pub group_by: Vec<Variable>,
    /// Result variable and aggregate, in binding order.
    pub aggregates: Vec<(Variable, Aggregate)>,
}

impl Aggregation {
    /// Creates an aggregation with a single implicit group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grouping variable.
    #[must_use]
    pub fn group_by(mut self, var: &str) -> Self {
        self.group_by.push(Variable::new(var));
        self
    }

    /// Binds an aggregate to a result variable.
    #[must_use]
    pub fn bind(mut self, var: &str, aggregate: Aggregate) -> Self {
        self.aggregates.push((Variable::new(var), aggregate));
        self
    }

    /// Returns the grouping and result variables.
    #[must_use]
    pub fn output_variables(&self) -> BTreeSet<Variable> {
        self.group_by
            .iter()
            .chain(self.aggregates.iter().map(|(v, _)| v))
            .cloned()
            .collect()
    }

    /// Checks the aggregation against the variables bound upstream.
    pub(crate) fn validate(&self, bound: &BTreeSet<Variable>) -> std::result::Result<(), String> {
        if self.aggregates.is_empty() {
            return Err("aggregation binds no aggregate".to_string());
        }
        for var in &self.group_by {
            if !bound.contains(var) {
                return Err(format!("grouping variable {var} is not bound by a positive pattern"));
            }
        }
        let mut results = BTreeSet::new();
        for (var, aggregate) in &self.aggregates {
            if self.group_by.contains(var) || !results.insert(var.clone()) {
                return Err(format!("aggregate result variable {var} is bound twice"));
            }
            if let Some(argument) = &aggregate.argument {
                if let Some(unbound) = argument.variables().difference(bound).next() {
                    return Err(format!(
                        "aggregate argument reads {unbound}, which is not bound by a positive pattern"
                    ));
                }
            } else if aggregate.function != AggregateFunction::Count {
                return Err(format!("aggregate for {var} needs an argument"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Evaluates expressions and aggregates.
pub trait Evaluator {
    /// Evaluates an expression against bindings.
    ///
    /// # Errors
    ///
    /// Returns an error for unbound variables, type mismatches, division by
    /// zero, or overflow.
    fn evaluate(&self, expr: &Expression, bindings: &Bindings) -> Result<Value>;

    /// Computes an aggregate over the members of a group.
    ///
    /// `members` repeats a binding once per supporting token.
    ///
    /// # Errors
    ///
    /// Returns the first argument evaluation error, except for `Count`,
    /// which skips members whose argument fails.
    fn aggregate(&self, aggregate: &Aggregate, members: &[&Bindings]) -> Result<Value> {
        let Some(argument) = &aggregate.argument else {
            let count = if aggregate.distinct {
                members.iter().collect::<HashSet<_>>().len()
            } else {
                members.len()
            };
            return i64::try_from(count)
                .map(Value::Integer)
                .map_err(|_| Error::new(ErrorKind::Overflow));
        };
        let mut values = Vec::with_capacity(members.len());
        for member in members {
            match self.evaluate(argument, member) {
                Ok(value) => values.push(value),
                Err(_) if aggregate.function == AggregateFunction::Count => {}
                Err(e) => return Err(e),
            }
        }
        if aggregate.distinct {
            let mut seen = HashSet::new();
            values.retain(|v| seen.insert(v.to_node()));
        }
        fold_aggregate(&aggregate.function, &values)
    }
}

fn fold_aggregate(function: &AggregateFunction, values: &[Value]) -> Result<Value> {
    match function {
        AggregateFunction::Count => Ok(Value::Integer(
            i64::try_from(values.len()).map_err(|_| Error::new(ErrorKind::Overflow))?,
        )),
        AggregateFunction::Sum => values
            .iter()
            .try_fold(Value::Integer(0), |acc, v| arithmetic(BinaryOp::Add, &acc, v)),
        AggregateFunction::Min | AggregateFunction::Max => {
            let wanted = if *function == AggregateFunction::Min {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            };
            let mut iter = values.iter();
            let first = iter
                .next()
                .ok_or_else(|| Error::new(ErrorKind::Internal("aggregate over empty group".into())))?;
            iter.try_fold(first.clone(), |best, v| {
                Ok(if v.compare(&best)? == wanted { v.clone() } else { best })
            })
        }
        AggregateFunction::Avg => {
            if values.is_empty() {
                return Ok(Value::Integer(0));
            }
            let sum = fold_aggregate(&AggregateFunction::Sum, values)?;
            let count = fold_aggregate(&AggregateFunction::Count, values)?;
            match sum.promote(&count)? {
                #[allow(clippy::cast_precision_loss)]
                Numeric::Integers(s, c) => Ok(Value::Decimal(s as f64 / c as f64)),
                Numeric::Decimals(s, c) => Ok(Value::Decimal(s / c)),
            }
        }
        AggregateFunction::GroupConcat { separator } => {
            let parts = values.iter().map(string_form).collect::<Result<Vec<_>>>()?;
            Ok(Value::String(parts.join(separator).into()))
        }
    }
}

/// The built-in evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEvaluator;

impl StandardEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for StandardEvaluator {
    fn evaluate(&self, expr: &Expression, bindings: &Bindings) -> Result<Value> {
        match expr {
            Expression::Variable(var) => bindings
                .get(var)
                .map(Value::from_node)
                .ok_or_else(|| Error::unbound_variable(var.name())),
            Expression::Constant(node) => Ok(Value::from_node(node)),
            Expression::Bound(var) => Ok(Value::Bool(bindings.contains(var))),
            Expression::Str(inner) => {
                let value = self.evaluate(inner, bindings)?;
                Ok(Value::String(string_form(&value)?.into()))
            }
            Expression::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&string_form(&self.evaluate(part, bindings)?)?);
                }
                Ok(Value::String(out.into()))
            }
            Expression::Unary(op, inner) => {
                let value = self.evaluate(inner, bindings)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!expect_bool(&value)?)),
                    UnaryOp::Negate => match value {
                        Value::Integer(n) => n
                            .checked_neg()
                            .map(Value::Integer)
                            .ok_or_else(|| Error::new(ErrorKind::Overflow)),
                        Value::Decimal(x) => Ok(Value::Decimal(-x)),
                        other => Err(Error::type_mismatch(ValueType::Numeric, other.value_type())),
                    },
                }
            }
            Expression::Binary(op, lhs, rhs) => {
                let left = self.evaluate(lhs, bindings)?;
                match op {
                    BinaryOp::And if !expect_bool(&left)? => return Ok(Value::Bool(false)),
                    BinaryOp::Or if expect_bool(&left)? => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right = self.evaluate(rhs, bindings)?;
                match op {
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                        arithmetic(*op, &left, &right)
                    }
                    BinaryOp::Eq => Ok(Value::Bool(left.same_term(&right))),
                    BinaryOp::Ne => Ok(Value::Bool(!left.same_term(&right))),
                    BinaryOp::Lt => Ok(Value::Bool(left.compare(&right)?.is_lt())),
                    BinaryOp::Le => Ok(Value::Bool(left.compare(&right)?.is_le())),
                    BinaryOp::Gt => Ok(Value::Bool(left.compare(&right)?.is_gt())),
                    BinaryOp::Ge => Ok(Value::Bool(left.compare(&right)?.is_ge())),
                    BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(expect_bool(&right)?)),
                }
            }
        }
    }
}

fn expect_bool(value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::type_mismatch(ValueType::Bool, value.value_type()))
}

/// Integer arithmetic stays integral unless a division is inexact.
#[allow(clippy::cast_precision_loss)]
fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let overflow = || Error::new(ErrorKind::Overflow);
    match left.promote(right)? {
        Numeric::Integers(a, b) => match op {
            BinaryOp::Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
            BinaryOp::Div => {
                if b == 0 {
                    Err(Error::new(ErrorKind::DivisionByZero))
                } else if a.checked_rem(b) == Some(0) {
                    a.checked_div(b).map(Value::Integer).ok_or_else(overflow)
                } else {
                    Ok(Value::Decimal(a as f64 / b as f64))
                }
            }
            _ => Err(Error::new(ErrorKind::Internal(format!("{op:?} is not arithmetic")))),
        },
        Numeric::Decimals(a, b) => match op {
            BinaryOp::Add => Ok(Value::Decimal(a + b)),
            BinaryOp::Sub => Ok(Value::Decimal(a - b)),
            BinaryOp::Mul => Ok(Value::Decimal(a * b)),
            BinaryOp::Div if b == 0.0 => Err(Error::new(ErrorKind::DivisionByZero)),
            BinaryOp::Div => Ok(Value::Decimal(a / b)),
            _ => Err(Error::new(ErrorKind::Internal(format!("{op:?} is not arithmetic")))),
        },
    }
}

fn string_form(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.to_string()),
        Value::Node(Node::Iri(iri)) => Ok(iri.as_str().to_string()),
        Value::Node(Node::Literal(lit)) => Ok(lit.lexical().to_string()),
        Value::Node(Node::Blank(_)) => Err(Error::type_mismatch(ValueType::String, ValueType::Node)),
        other => Ok(other.to_string()),
    }
}
