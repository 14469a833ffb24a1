//! Built-in functions visible at the Lillian language level.
//!
//! The table below is the single source of builtin names. An interpreter
//! binds it once to an output sink (see [`Builtins`]) and seeds the root
//! scope with the resulting invokable values.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::trace;

use crate::error::CoreError;
use crate::value::{Invokable, Value};

/// Shared sink that `print` and `println` write to.
pub type Output = Rc<RefCell<dyn Write>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// Writes each argument's display form.
    Print,
    /// `Print` followed by a newline.
    PrintLine,
    /// Returns the concatenated display forms as a string.
    Concat,
    /// `if(cond, then)` / `if(cond, then, else)` with function branches.
    If,
    /// `loop(count, body)` calls `body` `count` times.
    Loop,
}

/// Metadata about a single builtin symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    /// Name of the builtin at the language level.
    pub name: &'static str,
    pub kind: BuiltinKind,
}

/// The complete list of builtins known to the core.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        name: "print",
        kind: BuiltinKind::Print,
    },
    BuiltinDescriptor {
        name: "println",
        kind: BuiltinKind::PrintLine,
    },
    BuiltinDescriptor {
        name: "concat",
        kind: BuiltinKind::Concat,
    },
    BuiltinDescriptor {
        name: "if",
        kind: BuiltinKind::If,
    },
    BuiltinDescriptor {
        name: "loop",
        kind: BuiltinKind::Loop,
    },
];

/// The builtin table bound to an output sink.
#[derive(Clone)]
pub struct Builtins {
    output: Output,
}

impl fmt::Debug for Builtins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtins").finish_non_exhaustive()
    }
}

impl Builtins {
    pub fn new(output: Output) -> Self {
        Builtins { output }
    }

    pub fn stdout() -> Self {
        Builtins::new(Rc::new(RefCell::new(io::stdout())))
    }

    /// One invokable value per table entry, in table order.
    pub fn values(&self) -> Vec<(&'static str, Value)> {
        BUILTINS
            .iter()
            .map(|descriptor| {
                let builtin = Builtin {
                    descriptor,
                    output: self.output.clone(),
                };
                (descriptor.name, Value::Function(Rc::new(builtin)))
            })
            .collect()
    }
}

struct Builtin {
    descriptor: &'static BuiltinDescriptor,
    output: Output,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Builtin").field(&self.descriptor.name).finish()
    }
}

impl Invokable for Builtin {
    fn invoke(&self, args: Vec<Value>) -> Result<Value, CoreError> {
        trace!(builtin = self.descriptor.name, args = args.len(), "invoking builtin");
        match self.descriptor.kind {
            BuiltinKind::Print => self.print(&args, false),
            BuiltinKind::PrintLine => self.print(&args, true),
            BuiltinKind::Concat => Ok(Value::string(concat(&args))),
            BuiltinKind::If => call_if(args),
            BuiltinKind::Loop => call_loop(args),
        }
    }

    fn describe(&self) -> String {
        format!("<builtin {}>", self.descriptor.name)
    }
}

impl Builtin {
    fn print(&self, args: &[Value], newline: bool) -> Result<Value, CoreError> {
        let mut out = self.output.borrow_mut();
        for arg in args {
            write!(out, "{arg}")?;
        }
        if newline {
            writeln!(out)?;
        }
        out.flush()?;
        Ok(Value::Unit)
    }
}

fn concat(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

fn call_if(args: Vec<Value>) -> Result<Value, CoreError> {
    let mut args = args.into_iter();
    let condition = match args.next() {
        Some(Value::Bool(condition)) => condition,
        Some(other) => {
            return Err(CoreError::eval(format!(
                "if expects a bool condition, got {}",
                other.type_name()
            )));
        }
        None => return Err(CoreError::eval("if expects a condition and a branch")),
    };
    let then_branch = args
        .next()
        .ok_or_else(|| CoreError::eval("if expects a condition and a branch"))?;
    let else_branch = args.next();
    if args.next().is_some() {
        return Err(CoreError::eval("if takes at most three arguments"));
    }

    let then_branch = expect_function("if", then_branch)?;
    let else_branch = else_branch
        .map(|branch| expect_function("if", branch))
        .transpose()?;

    match (condition, else_branch) {
        (true, _) => then_branch.invoke(Vec::new()),
        (false, Some(else_branch)) => else_branch.invoke(Vec::new()),
        (false, None) => Ok(Value::Unit),
    }
}

fn call_loop(args: Vec<Value>) -> Result<Value, CoreError> {
    let [count, body]: [Value; 2] = args
        .try_into()
        .map_err(|_| CoreError::eval("loop expects a count and a body"))?;
    let count = match count {
        Value::Int(count) if count >= 0 => count,
        Value::Int(count) => {
            return Err(CoreError::eval(format!(
                "loop count must not be negative, got {count}"
            )));
        }
        other => {
            return Err(CoreError::eval(format!(
                "loop expects an int count, got {}",
                other.type_name()
            )));
        }
    };
    let body = expect_function("loop", body)?;

    let mut last = Value::Unit;
    for _ in 0..count {
        last = body.invoke(Vec::new())?;
    }
    Ok(last)
}

fn expect_function(builtin: &str, value: Value) -> Result<Rc<dyn Invokable>, CoreError> {
    match value {
        Value::Function(function) => Ok(function),
        other => Err(CoreError::eval(format!(
            "{builtin} expects a function, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        calls: Cell<i64>,
    }

    impl Invokable for Counter {
        fn invoke(&self, _args: Vec<Value>) -> Result<Value, CoreError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Value::Int(self.calls.get()))
        }

        fn describe(&self) -> String {
            "<counter>".to_string()
        }
    }

    fn bound(buffer: &Rc<RefCell<Vec<u8>>>, name: &str) -> Value {
        Builtins::new(buffer.clone())
            .values()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
            .expect("builtin present")
    }

    fn builtin(name: &str) -> Value {
        bound(&Rc::new(RefCell::new(Vec::new())), name)
    }

    #[test]
    fn table_covers_every_kind_once() {
        assert_eq!(BUILTINS.len(), 5);
        let names: Vec<_> = Builtins::new(Rc::new(RefCell::new(Vec::<u8>::new())))
            .values()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["print", "println", "concat", "if", "loop"]);
    }

    #[test]
    fn print_and_println_write_to_the_sink() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let print = bound(&buffer, "print");
        let println = bound(&buffer, "println");

        let result = print
            .call(vec![Value::string("x = "), Value::Int(3)])
            .expect("print");
        assert_eq!(result, Value::Unit);
        println.call(vec![Value::Bool(true)]).expect("println");

        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "x = 3true\n");
    }

    #[test]
    fn concat_joins_display_forms() {
        let result = builtin("concat")
            .call(vec![Value::string("a"), Value::Int(1), Value::Bool(false)])
            .expect("concat");
        assert_eq!(result, Value::string("a1false"));
        assert_eq!(builtin("concat").call(Vec::new()).expect("concat"), Value::string(""));
    }

    #[test]
    fn if_calls_only_the_chosen_branch() {
        let then_branch = Rc::new(Counter::default());
        let else_branch = Rc::new(Counter::default());
        let args = vec![
            Value::Bool(false),
            Value::Function(then_branch.clone()),
            Value::Function(else_branch.clone()),
        ];
        builtin("if").call(args).expect("if");
        assert_eq!(then_branch.calls.get(), 0);
        assert_eq!(else_branch.calls.get(), 1);

        let skipped = builtin("if")
            .call(vec![Value::Bool(false), Value::Function(then_branch.clone())])
            .expect("if without else");
        assert_eq!(skipped, Value::Unit);
    }

    #[test]
    fn if_rejects_non_bool_conditions() {
        let branch = Value::Function(Rc::new(Counter::default()));
        let err = builtin("if").call(vec![Value::Int(1), branch]).unwrap_err();
        assert!(matches!(err, CoreError::EvaluationError(ref m) if m.contains("bool")));
    }

    #[test]
    fn loop_returns_the_last_body_result() {
        let body = Rc::new(Counter::default());
        let result = builtin("loop")
            .call(vec![Value::Int(3), Value::Function(body.clone())])
            .expect("loop");
        assert_eq!(result, Value::Int(3));

        let none = builtin("loop")
            .call(vec![Value::Int(0), Value::Function(body)])
            .expect("loop zero");
        assert_eq!(none, Value::Unit);
    }

    #[test]
    fn loop_validates_its_arguments() {
        let body = Value::Function(Rc::new(Counter::default()));
        assert!(builtin("loop").call(vec![Value::Int(-1), body.clone()]).is_err());
        assert!(builtin("loop").call(vec![Value::Int(2)]).is_err());
        assert!(builtin("loop").call(vec![Value::Int(2), Value::Int(3)]).is_err());
    }
}
