//! Role membership expressions.
//!
//! A [`RoleQuery`] is a list of [`RoleExpression`]s combined with OR (the
//! default) or AND (`must_satisfy_all`). An [`RoleExpression::AllOf`] group is
//! always evaluated with AND, which is how `(A AND B) OR C` is written:
//!
//! ```
//! use common_token::role_query;
//!
//! let roles = vec!["A".to_string(), "B".to_string()];
//! assert!(role_query![["A", "B"], "C"].evaluate(&roles));
//! assert!(!role_query![all: "A", "C"].evaluate(&roles));
//! ```

use serde_json::Value;

use crate::error::{TokenError, TokenResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleExpression {
    Role(String),
    AllOf(Vec<RoleExpression>),
}

impl RoleExpression {
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }

    pub fn all_of<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RoleExpression>,
    {
        Self::AllOf(items.into_iter().map(Into::into).collect())
    }

    pub fn is_satisfied_by(&self, roles: &[String]) -> bool {
        match self {
            Self::Role(name) => roles.iter().any(|role| role == name),
            Self::AllOf(group) => evaluate(group, true, roles),
        }
    }

    /// Parse an untyped term: a string is a role, an array is an all-of group.
    pub fn from_value(value: &Value) -> TokenResult<Self> {
        match value {
            Value::String(name) => Ok(Self::Role(name.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_value)
                .collect::<TokenResult<Vec<_>>>()
                .map(Self::AllOf),
            other => Err(TokenError::InvalidRoleExpression(format!(
                "expected a role name or an array of role expressions, got {other}"
            ))),
        }
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Role(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::AllOf(group) => group.iter().for_each(|expr| expr.collect_names(out)),
        }
    }
}

impl From<&str> for RoleExpression {
    fn from(value: &str) -> Self {
        Self::Role(value.to_owned())
    }
}

impl From<String> for RoleExpression {
    fn from(value: String) -> Self {
        Self::Role(value)
    }
}

impl<T: Into<RoleExpression>> From<Vec<T>> for RoleExpression {
    fn from(value: Vec<T>) -> Self {
        Self::all_of(value)
    }
}

impl<T: Into<RoleExpression>, const N: usize> From<[T; N]> for RoleExpression {
    fn from(value: [T; N]) -> Self {
        Self::all_of(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleQuery {
    expressions: Vec<RoleExpression>,
    must_satisfy_all: bool,
}

impl RoleQuery {
    pub fn new(expressions: Vec<RoleExpression>, must_satisfy_all: bool) -> Self {
        Self {
            expressions,
            must_satisfy_all,
        }
    }

    /// Satisfied when any expression holds.
    pub fn any_of<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RoleExpression>,
    {
        Self::new(items.into_iter().map(Into::into).collect(), false)
    }

    /// Satisfied when every expression holds.
    pub fn all_of<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<RoleExpression>,
    {
        Self::new(items.into_iter().map(Into::into).collect(), true)
    }

    pub fn with_must_satisfy_all(mut self, must_satisfy_all: bool) -> Self {
        self.must_satisfy_all = must_satisfy_all;
        self
    }

    /// Parse the variadic argument shape: role names and nested arrays, with
    /// an optional trailing boolean taken as `must_satisfy_all`. Any other
    /// term (numbers, objects, a boolean elsewhere) is an error, not skipped.
    pub fn from_args(args: &[Value]) -> TokenResult<Self> {
        let (must_satisfy_all, terms) = match args.split_last() {
            Some((Value::Bool(flag), rest)) => (*flag, rest),
            _ => (false, args),
        };
        let expressions = terms
            .iter()
            .map(RoleExpression::from_value)
            .collect::<TokenResult<Vec<_>>>()?;
        Ok(Self::new(expressions, must_satisfy_all))
    }

    pub fn expressions(&self) -> &[RoleExpression] {
        &self.expressions
    }

    pub fn must_satisfy_all(&self) -> bool {
        self.must_satisfy_all
    }

    /// With no expressions this is `must_satisfy_all` itself: AND over nothing
    /// holds, OR over nothing does not.
    pub fn evaluate(&self, roles: &[String]) -> bool {
        evaluate(&self.expressions, self.must_satisfy_all, roles)
    }

    /// Distinct role names mentioned anywhere in the query, in first-seen order.
    pub fn role_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for expr in &self.expressions {
            expr.collect_names(&mut names);
        }
        names.into_iter().map(str::to_owned).collect()
    }
}

impl TryFrom<&Value> for RoleQuery {
    type Error = TokenError;

    fn try_from(value: &Value) -> TokenResult<Self> {
        match value {
            Value::Array(args) => Self::from_args(args),
            single => Self::from_args(std::slice::from_ref(single)),
        }
    }
}

fn evaluate(expressions: &[RoleExpression], must_satisfy_all: bool, roles: &[String]) -> bool {
    if must_satisfy_all {
        expressions.iter().all(|expr| expr.is_satisfied_by(roles))
    } else {
        expressions.iter().any(|expr| expr.is_satisfied_by(roles))
    }
}

/// Build a [`RoleQuery`] from role names and `[...]` all-of groups.
///
/// `role_query!["A", "B"]` is satisfied by either role;
/// `role_query![all: "A", "B"]` requires both;
/// `role_query![["A", "B"], "C"]` is `(A AND B) OR C`.
#[macro_export]
macro_rules! role_query {
    (all: $($expr:expr),* $(,)?) => {
        $crate::RoleQuery::new(
            ::std::vec![$($crate::RoleExpression::from($expr)),*],
            true,
        )
    };
    ($($expr:expr),* $(,)?) => {
        $crate::RoleQuery::new(
            ::std::vec![$($crate::RoleExpression::from($expr)),*],
            false,
        )
    };
}
