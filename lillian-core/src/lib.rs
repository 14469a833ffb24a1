//! Core of the Lillian scripting language.
//!
//! The pipeline is:
//!
//!   source .lil
//!     -> lexer      (tokens)
//!     -> parser     (expression tree, identifiers resolved through the scope chain)
//!     -> evaluator  (closures invoked over an activation of local slots)
//!
//! Higher-level tools (the CLI, script tests) should go through
//! [`Interpreter`] or [`compile`] rather than wiring the stages by hand.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod cursor;
pub mod scope;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Runtime: values, builtins and evaluation
// ---------------------------------------------------------------------

pub mod value;
pub mod builtins;
pub mod evaluator;

// ---------------------------------------------------------------------
// Pipeline orchestration
// ---------------------------------------------------------------------

pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use builtins::{Builtins, Output};
pub use compiler::{CompilationArtifact, Interpreter, compile};
pub use error::CoreError;
pub use lexer::{render_tokens, tokenize};
pub use parser::ParseConfig;
pub use value::{Invokable, Value};
