//! Peekable token cursor with checkpoints for backtracking.
//!
//! Checkpoints form a stack. Reverting or committing a checkpoint also
//! discards every checkpoint saved after it, so a handle that outlived
//! its enclosing attempt can never move the cursor.

use crate::error::CoreError;
use crate::lexer::Token;

/// Handle returned by [`TokenCursor::save`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a checkpoint must be reverted or committed"]
pub struct Checkpoint {
    depth: usize,
    id: u64,
}

#[derive(Debug)]
struct Mark {
    id: u64,
    position: usize,
    label: Option<&'static str>,
}

#[derive(Debug)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    /// Index of the next token `advance` returns.
    position: usize,
    marks: Vec<Mark>,
    next_id: u64,
}

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        TokenCursor {
            tokens,
            position: 0,
            marks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    /// Return the token at the read position and move past it.
    pub fn advance(&mut self) -> Result<&'t Token, CoreError> {
        let token = self.tokens.get(self.position).ok_or(CoreError::OutOfTokens)?;
        self.position += 1;
        Ok(token)
    }

    /// Advance only when the next token satisfies `accept`.
    pub fn next_if(&mut self, accept: impl FnOnce(&Token) -> bool) -> Option<&'t Token> {
        let token = self.peek().filter(|token| accept(token))?;
        self.position += 1;
        Some(token)
    }

    /// The token most recently returned by `advance`.
    pub fn current(&self) -> Result<&'t Token, CoreError> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .ok_or(CoreError::OutOfTokens)
    }

    /// Line of the token under the cursor, for error reporting.
    pub fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.current().ok())
            .map_or(0, |token| token.line)
    }

    pub fn save(&mut self) -> Checkpoint {
        self.push_mark(None)
    }

    pub fn save_named(&mut self, label: &'static str) -> Checkpoint {
        self.push_mark(Some(label))
    }

    /// Move back to `checkpoint` and drop it along with every later one.
    pub fn revert(&mut self, checkpoint: Checkpoint) -> Result<(), CoreError> {
        let position = self.validate(&checkpoint)?;
        self.position = position;
        self.marks.truncate(checkpoint.depth);
        Ok(())
    }

    /// Revert to the innermost live checkpoint saved under `label`.
    pub fn revert_named(&mut self, label: &str) -> Result<(), CoreError> {
        let depth = self
            .marks
            .iter()
            .rposition(|mark| mark.label == Some(label))
            .ok_or(CoreError::StaleCheckpoint)?;
        self.position = self.marks[depth].position;
        self.marks.truncate(depth);
        Ok(())
    }

    /// Keep the current position and release `checkpoint`.
    pub fn commit(&mut self, checkpoint: Checkpoint) -> Result<(), CoreError> {
        self.validate(&checkpoint)?;
        self.marks.truncate(checkpoint.depth);
        Ok(())
    }

    fn push_mark(&mut self, label: Option<&'static str>) -> Checkpoint {
        let id = self.next_id;
        self.next_id += 1;
        let depth = self.marks.len();
        self.marks.push(Mark {
            id,
            position: self.position,
            label,
        });
        Checkpoint { depth, id }
    }

    fn validate(&self, checkpoint: &Checkpoint) -> Result<usize, CoreError> {
        match self.marks.get(checkpoint.depth) {
            Some(mark) if mark.id == checkpoint.id => Ok(mark.position),
            _ => Err(CoreError::StaleCheckpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn advance_and_current_track_the_read_position() {
        let tokens = tokenize("let x = 1;").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(matches!(cursor.current(), Err(CoreError::OutOfTokens)));
        assert_eq!(cursor.peek(), Some(&tokens[0]));

        let first = cursor.advance().expect("first token");
        assert_eq!(first, &tokens[0]);
        assert_eq!(cursor.current().expect("current"), &tokens[0]);
        assert_eq!(cursor.peek(), Some(&tokens[1]));
    }

    #[test]
    fn next_if_only_consumes_accepted_tokens() {
        let tokens = tokenize("fun x").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.next_if(|t| t.is_symbol(crate::lexer::Symbol::LParen)).is_none());
        assert_eq!(cursor.position(), 0);
        let token = cursor.next_if(|t| t.is_keyword(crate::lexer::Keyword::Fun));
        assert_eq!(token, Some(&tokens[0]));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn running_out_of_tokens_is_reported() {
        let tokens = tokenize("1").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        cursor.advance().expect("one token");
        assert!(!cursor.has_next());
        assert!(matches!(cursor.advance(), Err(CoreError::OutOfTokens)));
    }

    #[test]
    fn revert_restores_the_saved_position() {
        let tokens = tokenize("a b c d").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        cursor.advance().expect("a");
        let checkpoint = cursor.save();
        cursor.advance().expect("b");
        cursor.advance().expect("c");
        cursor.revert(checkpoint).expect("revert");
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.peek(), Some(&tokens[1]));
    }

    #[test]
    fn reverting_an_outer_checkpoint_invalidates_inner_ones() {
        let tokens = tokenize("a b c d").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        let outer = cursor.save();
        cursor.advance().expect("a");
        let inner = cursor.save();
        cursor.advance().expect("b");

        cursor.revert(outer).expect("revert outer");
        assert_eq!(cursor.position(), 0);
        assert!(matches!(cursor.revert(inner), Err(CoreError::StaleCheckpoint)));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn checkpoints_at_the_same_position_stay_distinct() {
        let tokens = tokenize("a b").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        let outer = cursor.save();
        let inner = cursor.save();
        cursor.advance().expect("a");
        cursor.revert(inner).expect("revert inner");

        // The outer attempt still owns a valid rollback target.
        cursor.advance().expect("a again");
        cursor.revert(outer).expect("revert outer");
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn commit_releases_nested_checkpoints() {
        let tokens = tokenize("a b").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        let outer = cursor.save();
        let inner = cursor.save();
        cursor.advance().expect("a");
        cursor.commit(outer).expect("commit");
        assert_eq!(cursor.position(), 1);
        assert!(matches!(cursor.commit(inner), Err(CoreError::StaleCheckpoint)));
    }

    #[test]
    fn named_checkpoints_revert_to_the_innermost_label() {
        let tokens = tokenize("a b c").expect("tokenize");
        let mut cursor = TokenCursor::new(&tokens);
        let _first = cursor.save_named("statement");
        cursor.advance().expect("a");
        let _second = cursor.save_named("statement");
        cursor.advance().expect("b");

        cursor.revert_named("statement").expect("revert");
        assert_eq!(cursor.position(), 1);
        cursor.revert_named("statement").expect("revert again");
        assert_eq!(cursor.position(), 0);
        assert!(matches!(
            cursor.revert_named("statement"),
            Err(CoreError::StaleCheckpoint)
        ));
    }
}
