use serde::Serialize;

/// A node of a build file expression tree.
///
/// Only the shape and values are fixed here; turning the tree into text is left
/// to a formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    /// A bare token such as an identifier or a number.
    Literal { token: String },
    String { value: String },
    List {
        items: Vec<Expr>,
        force_multiline: bool,
    },
    Dict {
        entries: Vec<DictEntry>,
        force_multiline: bool,
    },
    Call { func: Box<Expr>, args: Vec<Expr> },
    Binary {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictEntry {
    pub key: Expr,
    pub value: Expr,
}

impl Expr {
    pub fn literal(token: impl Into<String>) -> Self {
        Expr::Literal {
            token: token.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String {
            value: value.into(),
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Expr::List {
            items,
            force_multiline: false,
        }
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(Expr::literal(func)),
            args,
        }
    }

    pub fn binary(lhs: Expr, op: impl Into<String>, rhs: Expr) -> Self {
        Expr::Binary {
            lhs: Box::new(lhs),
            op: op.into(),
            rhs: Box::new(rhs),
        }
    }

    /// `key = value`, as used for keyword arguments.
    pub fn keyword(key: impl Into<String>, value: Expr) -> Self {
        Expr::binary(Expr::literal(key), "=", value)
    }

    /// Marks a list or dict to be written one element per line. Other
    /// expressions are returned unchanged.
    pub fn multiline(mut self) -> Self {
        match &mut self {
            Expr::List {
                force_multiline, ..
            }
            | Expr::Dict {
                force_multiline, ..
            } => *force_multiline = true,
            _ => {}
        }
        self
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::String { value } => Some(value),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Expr]> {
        match self {
            Expr::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(
            self,
            Expr::List {
                force_multiline: true,
                ..
            } | Expr::Dict {
                force_multiline: true,
                ..
            }
        )
    }
}

/// A rule declaration: a call whose keyword arguments are its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rule {
    call: Expr,
}

impl Rule {
    pub fn new(kind: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            call: Expr::call(kind, args),
        }
    }

    pub fn kind(&self) -> &str {
        match &self.call {
            Expr::Call { func, .. } => match func.as_ref() {
                Expr::Literal { token } => token,
                _ => "",
            },
            _ => "",
        }
    }

    pub fn args(&self) -> &[Expr] {
        match &self.call {
            Expr::Call { args, .. } => args,
            _ => &[],
        }
    }

    /// Value of the keyword argument `key`.
    pub fn attr(&self, key: &str) -> Option<&Expr> {
        self.args().iter().find_map(|arg| match arg {
            Expr::Binary { lhs, op, rhs } if op == "=" => match lhs.as_ref() {
                Expr::Literal { token } if token == key => Some(rhs.as_ref()),
                _ => None,
            },
            _ => None,
        })
    }

    /// Names of the keyword arguments, in order.
    pub fn attr_keys(&self) -> Vec<&str> {
        self.args()
            .iter()
            .filter_map(|arg| match arg {
                Expr::Binary { lhs, op, .. } if op == "=" => match lhs.as_ref() {
                    Expr::Literal { token } => Some(token.as_str()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    pub fn name(&self) -> Option<&str> {
        self.attr("name").and_then(Expr::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
