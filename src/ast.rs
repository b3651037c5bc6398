/// Input syntax tree for the analyzer.
///
/// The analyzer does not parse source text; the external parser hands it a
/// tree whose nodes are tagged with `_astname` and carry `lineno` /
/// `col_offset`. These types deserialize that shape directly, so a JSON dump
/// from the parser is a valid input file.
use std::fmt;
use std::rc::Rc;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Source location attached to every statement and expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// One source unit. Extra fields from the parser (including its own
/// `_astname: "Module"` tag) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub lineno: u32,
    #[serde(default)]
    pub col_offset: u32,
    #[serde(flatten)]
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32, column: u32) -> Self {
        Stmt {
            lineno: line,
            col_offset: column,
            kind,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.lineno, self.col_offset)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "_astname")]
pub enum StmtKind {
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    FunctionDef {
        name: String,
        #[serde(default)]
        args: Arguments,
        body: Rc<Vec<Stmt>>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    With {
        context_expr: Expr,
        #[serde(default)]
        optional_vars: Option<Expr>,
        body: Vec<Stmt>,
    },
    Expr {
        value: Expr,
    },
    Pass {},
}

/// Formal parameter list of a `FunctionDef`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Arg {
    pub arg: String,
    #[serde(default)]
    pub lineno: u32,
    #[serde(default)]
    pub col_offset: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub lineno: u32,
    #[serde(default)]
    pub col_offset: u32,
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32, column: u32) -> Self {
        Expr {
            lineno: line,
            col_offset: column,
            kind,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.lineno, self.col_offset)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "_astname")]
pub enum ExprKind {
    BinOp {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    BoolOp {
        values: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        #[serde(default)]
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Slice>,
    },
    Name {
        id: String,
        #[serde(default)]
        ctx: NameCtx,
    },
    Num {
        #[serde(default)]
        n: f64,
    },
    Str {
        #[serde(default)]
        s: String,
    },
    Bool {
        #[serde(default)]
        value: bool,
    },
    List {
        #[serde(default)]
        elts: Vec<Expr>,
    },
    Tuple {
        #[serde(default)]
        elts: Vec<Expr>,
    },
    Dict {
        #[serde(default)]
        keys: Vec<Expr>,
        #[serde(default)]
        values: Vec<Expr>,
    },
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

/// Subscript slice: a single index or a range slice.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "_astname")]
pub enum Slice {
    Index {
        value: Box<Expr>,
    },
    Slice {
        #[serde(default)]
        lower: Option<Box<Expr>>,
        #[serde(default)]
        upper: Option<Box<Expr>>,
        #[serde(default)]
        step: Option<Box<Expr>>,
    },
}

/// One `for target in iter [if cond]*` clause of a comprehension.
#[derive(Debug, Clone, Deserialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    #[serde(default)]
    pub ifs: Vec<Expr>,
}

/// Name expression context. Parsers emit either a bare string (`"Load"`) or a
/// node object (`{"_astname": "Load"}`); both are accepted. Anything that is
/// not a load is a binding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCtx {
    #[default]
    Load,
    Store,
    Del,
}

impl<'de> Deserialize<'de> for NameCtx {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = AstTag::deserialize(deserializer)?;
        Ok(match tag.0.as_str() {
            "Load" => NameCtx::Load,
            "Del" => NameCtx::Del,
            _ => NameCtx::Store,
        })
    }
}

/// Binary operator. Only the arithmetic subset is part of the language; an
/// unknown operator tag is a malformed tree and fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Pow,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "Add",
            Operator::Sub => "Sub",
            Operator::Mult => "Mult",
            Operator::Div => "Div",
            Operator::Mod => "Mod",
            Operator::Pow => "Pow",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = AstTag::deserialize(deserializer)?;
        match tag.0.as_str() {
            "Add" => Ok(Operator::Add),
            "Sub" => Ok(Operator::Sub),
            "Mult" => Ok(Operator::Mult),
            "Div" => Ok(Operator::Div),
            "Mod" => Ok(Operator::Mod),
            "Pow" => Ok(Operator::Pow),
            other => Err(de::Error::custom(format!(
                "unsupported binary operator '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    USub,
    UAdd,
    Invert,
}

impl<'de> Deserialize<'de> for UnaryOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = AstTag::deserialize(deserializer)?;
        match tag.0.as_str() {
            "Not" => Ok(UnaryOperator::Not),
            "USub" => Ok(UnaryOperator::USub),
            "UAdd" => Ok(UnaryOperator::UAdd),
            "Invert" => Ok(UnaryOperator::Invert),
            other => Err(de::Error::custom(format!(
                "unsupported unary operator '{}'",
                other
            ))),
        }
    }
}

/// A tag that may arrive as a bare string or as `{"_astname": "..."}`.
struct AstTag(String);

impl<'de> Deserialize<'de> for AstTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(String),
            Node {
                #[serde(rename = "_astname")]
                astname: String,
            },
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(s) => AstTag(s),
            Raw::Node { astname } => AstTag(astname),
        })
    }
}
