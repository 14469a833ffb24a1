//! Tree-walking evaluator for the expression tree.
//!
//! Every closure invocation gets a fresh activation holding the locals of
//! its body block; captured values are copied into the closure when the
//! `fun` expression is evaluated.

use std::cmp::Ordering;
use std::rc::Rc;

use tracing::trace;

use crate::ast::{BinaryOperator, Block, Expr, Lambda, Slot};
use crate::error::CoreError;
use crate::value::{Invokable, Value};

/// A lambda together with the values it captured.
#[derive(Debug)]
pub struct Closure {
    lambda: Rc<Lambda>,
    captures: Vec<Value>,
}

impl Invokable for Closure {
    fn invoke(&self, args: Vec<Value>) -> Result<Value, CoreError> {
        let lambda = &self.lambda;
        if lambda.params.is_empty() && !args.is_empty() {
            trace!(ignored = args.len(), "zero-parameter function called with arguments");
        }

        let mut activation = Activation {
            locals: vec![Value::Unit; lambda.frame_size()],
            captures: &self.captures,
        };
        let mut args = args.into_iter();
        for &slot in &lambda.params {
            let arg = args
                .next()
                .ok_or_else(|| CoreError::eval("missing argument for function parameter"))?;
            activation.store(slot, arg)?;
        }
        activation.run_block(&lambda.body)
    }

    fn describe(&self) -> String {
        "<fun>".to_string()
    }
}

/// Turn a parsed program into something that can be invoked.
///
/// A program is the outermost lambda; it has nothing to capture from.
pub fn compile(program: Rc<Lambda>) -> Result<Closure, CoreError> {
    if !program.captures.is_empty() {
        return Err(CoreError::eval(
            "a top-level program cannot capture enclosing variables",
        ));
    }
    Ok(Closure {
        lambda: program,
        captures: Vec::new(),
    })
}

pub fn invoke(callable: &dyn Invokable, args: Vec<Value>) -> Result<Value, CoreError> {
    callable.invoke(args)
}

struct Activation<'c> {
    locals: Vec<Value>,
    captures: &'c [Value],
}

impl Activation<'_> {
    fn run_block(&mut self, block: &Block) -> Result<Value, CoreError> {
        let mut last = Value::Unit;
        for statement in &block.statements {
            last = self.eval(statement)?;
        }
        Ok(last)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, CoreError> {
        match expr {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::VariableRef { name, slot, .. } => self.load(*slot).ok_or_else(|| {
                CoreError::eval(format!("variable '{name}' has no storage slot"))
            }),
            Expr::Assign { slot, value, .. } => {
                let value = self.eval(value)?;
                self.store(*slot, value.clone())?;
                Ok(value)
            }
            Expr::BinaryOp { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply_binary(*op, lhs, rhs)
            }
            Expr::Invoke { callee, args } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                callee.call(args)
            }
            Expr::Lambda(lambda) => {
                let captures = lambda
                    .captures
                    .iter()
                    .map(|slot| {
                        self.load(*slot)
                            .ok_or_else(|| CoreError::eval("captured slot is out of range"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Function(Rc::new(Closure {
                    lambda: Rc::clone(lambda),
                    captures,
                })))
            }
        }
    }

    fn load(&self, slot: Slot) -> Option<Value> {
        match slot {
            Slot::Local(index) => self.locals.get(index).cloned(),
            Slot::Capture(index) => self.captures.get(index).cloned(),
        }
    }

    fn store(&mut self, slot: usize, value: Value) -> Result<(), CoreError> {
        let local = self
            .locals
            .get_mut(slot)
            .ok_or_else(|| CoreError::eval(format!("local slot {slot} was never allocated")))?;
        *local = value;
        Ok(())
    }
}

fn apply_binary(op: BinaryOperator, lhs: Value, rhs: Value) -> Result<Value, CoreError> {
    use BinaryOperator::*;

    match (op, &lhs, &rhs) {
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
        (Divide | Modulo, Value::Int(_), Value::Int(0)) => {
            Err(CoreError::eval("division by zero"))
        }
        (Add | Subtract | Multiply | Divide | Modulo, Value::Int(a), Value::Int(b)) => {
            let result = match op {
                Add => a.checked_add(*b),
                Subtract => a.checked_sub(*b),
                Multiply => a.checked_mul(*b),
                Divide => a.checked_div(*b),
                _ => a.checked_rem(*b),
            };
            result.map(Value::Int).ok_or_else(|| {
                CoreError::eval(format!("integer overflow in {a} {} {b}", op.symbol()))
            })
        }
        (Equal | NotEqual, _, _) if same_primitive_type(&lhs, &rhs) => {
            Ok(Value::Bool((lhs == rhs) == (op == Equal)))
        }
        (Greater | GreaterEqual | Less | LessEqual, Value::Int(a), Value::Int(b)) => {
            Ok(Value::Bool(ordering_holds(op, a.cmp(b))))
        }
        (Greater | GreaterEqual | Less | LessEqual, Value::Str(a), Value::Str(b)) => {
            Ok(Value::Bool(ordering_holds(op, a.cmp(b))))
        }
        _ => Err(CoreError::eval(format!(
            "operator '{}' is not defined for {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn same_primitive_type(lhs: &Value, rhs: &Value) -> bool {
    matches!(
        (lhs, rhs),
        (Value::Unit, Value::Unit)
            | (Value::Int(_), Value::Int(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Str(_), Value::Str(_))
    )
}

fn ordering_holds(op: BinaryOperator, ordering: Ordering) -> bool {
    match op {
        BinaryOperator::Greater => ordering.is_gt(),
        BinaryOperator::GreaterEqual => ordering.is_ge(),
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        _ => false,
    }
}
