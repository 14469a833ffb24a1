//! Lexical scopes used while parsing.
//!
//! Scopes are kept in an arena: a stack of nodes where each node's parent
//! is the node below it. Every node after the root stands for one function
//! body (or the program body) and owns the local slots of that activation.
//!
//! Resolving a variable that lives in an enclosing function registers it
//! in the capture list of every node in between, so at run time each
//! closure only ever reads its own locals and its own captured values.

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::Slot;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("identifier '{0}' is already bound in this scope")]
    AlreadyBound(String),
    #[error("identifier '{0}' has not been declared")]
    NotDeclared(String),
}

#[derive(Debug, Clone)]
pub enum Binding {
    Variable { slot: usize, invokable: bool },
    Constant(Value),
}

/// What an identifier refers to from the innermost scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Variable { slot: Slot, invokable: bool },
    Constant(Value),
}

#[derive(Debug, Clone)]
struct Capture {
    name: String,
    source: Slot,
    invokable: bool,
}

#[derive(Debug, Default)]
struct ScopeNode {
    bindings: HashMap<String, Binding>,
    next_slot: usize,
    captures: Vec<Capture>,
}

impl ScopeNode {
    fn lookup(&self, name: &str) -> Option<Resolved> {
        if let Some(binding) = self.bindings.get(name) {
            return Some(match binding {
                Binding::Variable { slot, invokable } => Resolved::Variable {
                    slot: Slot::Local(*slot),
                    invokable: *invokable,
                },
                Binding::Constant(value) => Resolved::Constant(value.clone()),
            });
        }
        self.captures
            .iter()
            .position(|capture| capture.name == name)
            .map(|index| Resolved::Variable {
                slot: Slot::Capture(index),
                invokable: self.captures[index].invokable,
            })
    }
}

#[derive(Debug)]
pub struct ScopeChain {
    nodes: Vec<ScopeNode>,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    /// A chain holding a single, empty root scope.
    pub fn new() -> Self {
        ScopeChain {
            nodes: vec![ScopeNode::default()],
        }
    }

    /// A chain whose root scope is seeded with constant bindings.
    pub fn with_constants<'a>(constants: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut chain = ScopeChain::new();
        for (name, value) in constants {
            // Later entries win, matching a table lookup by name.
            chain.top_mut().bindings.insert(name.to_string(), Binding::Constant(value));
        }
        chain
    }

    /// Open a child scope for a nested block.
    pub fn push(&mut self) {
        self.nodes.push(ScopeNode::default());
    }

    /// Close the innermost scope, returning the enclosing slots it captured.
    /// The root scope is never popped.
    pub fn pop(&mut self) -> Vec<Slot> {
        if self.nodes.len() == 1 {
            return Vec::new();
        }
        self.nodes
            .pop()
            .map(|node| node.captures.into_iter().map(|c| c.source).collect())
            .unwrap_or_default()
    }

    /// Whether `name` is bound in the innermost scope itself.
    pub fn contains(&self, name: &str) -> bool {
        self.top().bindings.contains_key(name)
    }

    /// Bind a new variable in the innermost scope and return its local slot.
    pub fn declare_variable(&mut self, name: &str, invokable: bool) -> Result<usize, ScopeError> {
        let node = self.top();
        let slot = node.next_slot;
        self.declare(name, Binding::Variable { slot, invokable })?;
        self.top_mut().next_slot += 1;
        Ok(slot)
    }

    pub fn declare(&mut self, name: &str, binding: Binding) -> Result<(), ScopeError> {
        if self.contains(name) {
            return Err(ScopeError::AlreadyBound(name.to_string()));
        }
        self.top_mut().bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Resolve `name` from the innermost scope outward.
    pub fn resolve(&mut self, name: &str) -> Result<Resolved, ScopeError> {
        let innermost = self.nodes.len() - 1;
        self.resolve_in(innermost, name)
            .ok_or_else(|| ScopeError::NotDeclared(name.to_string()))
    }

    fn resolve_in(&mut self, depth: usize, name: &str) -> Option<Resolved> {
        if let Some(found) = self.nodes[depth].lookup(name) {
            return Some(found);
        }
        let outer = self.resolve_in(depth.checked_sub(1)?, name)?;
        Some(match outer {
            Resolved::Constant(value) => Resolved::Constant(value),
            Resolved::Variable { slot, invokable } => {
                let captures = &mut self.nodes[depth].captures;
                captures.push(Capture {
                    name: name.to_string(),
                    source: slot,
                    invokable,
                });
                Resolved::Variable {
                    slot: Slot::Capture(captures.len() - 1),
                    invokable,
                }
            }
        })
    }

    fn top(&self) -> &ScopeNode {
        &self.nodes[self.nodes.len() - 1]
    }

    fn top_mut(&mut self) -> &mut ScopeNode {
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }
}
