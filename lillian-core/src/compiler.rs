use std::rc::Rc;

use tracing::debug;

use crate::ast::Lambda;
use crate::builtins::{Builtins, Output};
use crate::error::CoreError;
use crate::evaluator;
use crate::lexer::{Token, tokenize};
use crate::parser::{ParseConfig, Parser};
use crate::scope::ScopeChain;
use crate::value::{Invokable, Value};

#[derive(Debug, PartialEq)]
pub struct CompilationArtifact {
    pub tokens: Vec<Token>,
    pub program: Rc<Lambda>,
}

/// Lex and parse `source` with `builtins` bound in the root scope.
pub fn compile(
    source: &str,
    builtins: &Builtins,
    config: &ParseConfig,
) -> Result<CompilationArtifact, CoreError> {
    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "lexed source");

    let root = ScopeChain::with_constants(builtins.values());
    let program = Parser::new(&tokens, root, *config).parse()?;
    Ok(CompilationArtifact { tokens, program })
}

/// Runs scripts against one set of builtins.
#[derive(Debug, Clone)]
pub struct Interpreter {
    builtins: Builtins,
    config: ParseConfig,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter whose `print` builtins write to stdout.
    pub fn new() -> Self {
        Interpreter {
            builtins: Builtins::stdout(),
            config: ParseConfig::default(),
        }
    }

    pub fn with_output(output: Output) -> Self {
        Interpreter {
            builtins: Builtins::new(output),
            config: ParseConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn compile(&self, source: &str) -> Result<CompilationArtifact, CoreError> {
        compile(source, &self.builtins, &self.config)
    }

    /// Compile and run `source`, returning the value of its last statement.
    pub fn run(&self, source: &str) -> Result<Value, CoreError> {
        let artifact = self.compile(source)?;
        let program = evaluator::compile(artifact.program)?;
        let value = program.invoke(Vec::new())?;
        debug!(result = %value, "program finished");
        Ok(value)
    }
}
