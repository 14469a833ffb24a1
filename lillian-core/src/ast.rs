//! Expression tree produced by the parser and consumed by the evaluator.
//!
//! Identifiers are already resolved when a node is built: a variable
//! reference carries the storage slot it reads, and a lambda carries the
//! list of enclosing slots it captures.

use std::fmt;
use std::rc::Rc;

use crate::lexer::Operator;
use crate::value::Value;

/// Storage location of a variable inside an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index into the current activation's locals.
    Local(usize),
    /// Index into the values captured by the running closure.
    Capture(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl BinaryOperator {
    pub fn from_operator(op: Operator) -> Option<BinaryOperator> {
        Some(match op {
            Operator::Plus => BinaryOperator::Add,
            Operator::Minus => BinaryOperator::Subtract,
            Operator::Times => BinaryOperator::Multiply,
            Operator::Divide => BinaryOperator::Divide,
            Operator::Modulo => BinaryOperator::Modulo,
            Operator::Equal => BinaryOperator::Equal,
            Operator::NotEqual => BinaryOperator::NotEqual,
            Operator::Greater => BinaryOperator::Greater,
            Operator::GreaterEqual => BinaryOperator::GreaterEqual,
            Operator::Less => BinaryOperator::Less,
            Operator::LessEqual => BinaryOperator::LessEqual,
            Operator::Assign => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEqual
                | BinaryOperator::Less
                | BinaryOperator::LessEqual
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Value),
    VariableRef {
        name: String,
        slot: Slot,
        /// Whether the bound value is known to be callable.
        invokable: bool,
    },
    Assign {
        name: String,
        slot: usize,
        value: Box<Expr>,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Lambda(Rc<Lambda>),
}

impl Expr {
    /// The no-op expression an empty statement evaluates to.
    pub fn noop() -> Expr {
        Expr::Constant(Value::Unit)
    }

    /// Whether calling this expression's value is allowed at parse time.
    pub fn is_invokable(&self) -> bool {
        match self {
            Expr::Lambda(_) => true,
            Expr::Constant(value) => value.as_function().is_some(),
            Expr::VariableRef { invokable, .. } => *invokable,
            _ => false,
        }
    }
}

/// A statement list plus the local slots its direct `let` statements declare.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub declared: Vec<usize>,
    pub statements: Vec<Expr>,
}

impl Block {
    /// Build a block, collecting the slots of its direct `Assign` statements.
    /// Assignments nested inside other expressions do not count.
    pub fn new(statements: Vec<Expr>) -> Block {
        let declared = statements
            .iter()
            .filter_map(|statement| match statement {
                Expr::Assign { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        Block {
            declared,
            statements,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Local slots bound positionally from the call arguments. `fun ()`
    /// literals take no parameters, so parsed lambdas leave this empty.
    pub params: Vec<usize>,
    pub body: Block,
    /// Slots of the defining activation copied into each closure.
    pub captures: Vec<Slot>,
}

impl Lambda {
    /// Number of local slots an activation of this lambda needs.
    pub fn frame_size(&self) -> usize {
        self.params
            .iter()
            .chain(&self.body.declared)
            .max()
            .map_or(0, |max| max + 1)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(Value::Str(text)) => write!(f, "'{text}'"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::VariableRef { name, .. } => f.write_str(name),
            Expr::Assign { name, value, .. } => write!(f, "let {name} = {value}"),
            Expr::BinaryOp { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Invoke { callee, args } => {
                write!(f, "{callee}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Lambda(lambda) => write!(f, "{lambda}"),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fun() {")?;
        for statement in &self.body.statements {
            write!(f, " {statement};")?;
        }
        f.write_str(" }")
    }
}
