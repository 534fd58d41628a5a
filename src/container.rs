//! Per-decode session state

use std::fmt;

use crate::decoder::Decodable;
use crate::error::DecodeError;
use crate::grammar::GrammarState;

/// Mutable state of one decode: grammar state, open TLVs and the object being built
///
/// A container belongs to exactly one decode session. It can be cloned to
/// checkpoint a decode at a TLV boundary.
pub struct Container<T: Decodable> {
    state: T::State,
    grammar_end_allowed: bool,
    /// Bytes still owed to each open constructed TLV, outermost first
    levels: Vec<usize>,
    position: usize,
    complete: bool,
    target: T,
}

impl<T: Decodable> Container<T> {
    pub fn new() -> Self {
        Container {
            state: T::State::START,
            grammar_end_allowed: false,
            levels: Vec::new(),
            position: 0,
            complete: false,
            target: T::default(),
        }
    }

    pub fn state(&self) -> T::State {
        self.state
    }

    pub fn grammar_end_allowed(&self) -> bool {
        self.grammar_end_allowed
    }

    /// Let an action declare that the structure may end here
    pub fn set_grammar_end_allowed(&mut self, allowed: bool) {
        self.grammar_end_allowed = allowed;
    }

    /// Absolute position of the next TLV to read
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of open constructed TLVs
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Bytes still expected by the innermost open TLV
    pub fn remaining(&self) -> Option<usize> {
        self.levels.last().copied()
    }

    /// True once the top-level TLV has been fully consumed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Hand the decoded object over to the caller
    pub fn finish(self) -> Result<T, DecodeError> {
        if self.complete && self.grammar_end_allowed {
            Ok(self.target)
        } else {
            Err(DecodeError::PrematureEnd {
                grammar: T::grammar().name(),
                state: format!("{:?}", self.state),
            })
        }
    }

    pub(crate) fn transition(&mut self, next: T::State, end_allowed: bool) {
        self.state = next;
        self.grammar_end_allowed = end_allowed;
    }

    /// Account for `consumed` bytes in every open TLV, then open a new one if asked
    ///
    /// The engine has checked that `consumed` fits in the innermost level,
    /// which is never larger than its ancestors.
    pub(crate) fn advance(&mut self, consumed: usize, opened: Option<usize>) {
        self.position += consumed;
        for remaining in &mut self.levels {
            *remaining -= consumed;
        }
        if let Some(length) = opened {
            self.levels.push(length);
        }
        while self.levels.last() == Some(&0) {
            self.levels.pop();
        }
        if self.levels.is_empty() {
            self.complete = true;
        }
    }
}

impl<T: Decodable> Default for Container<T> {
    fn default() -> Self {
        Container::new()
    }
}

impl<T: Decodable + Clone> Clone for Container<T> {
    fn clone(&self) -> Self {
        Container {
            state: self.state,
            grammar_end_allowed: self.grammar_end_allowed,
            levels: self.levels.clone(),
            position: self.position,
            complete: self.complete,
            target: self.target.clone(),
        }
    }
}

impl<T: Decodable + fmt::Debug> fmt::Debug for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Container")
            .field("grammar", &T::grammar().name())
            .field("state", &self.state)
            .field("grammar_end_allowed", &self.grammar_end_allowed)
            .field("levels", &self.levels)
            .field("position", &self.position)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krb5::HostAddress;

    #[test]
    fn levels_close_when_exhausted() {
        let mut c = Container::<HostAddress>::new();
        c.advance(2, Some(10));
        assert_eq!(c.remaining(), Some(10));
        c.advance(2, Some(3));
        assert_eq!((c.depth(), c.remaining()), (2, Some(3)));
        c.advance(3, None);
        assert_eq!((c.depth(), c.remaining()), (1, Some(5)));
        assert!(!c.is_complete());
        c.advance(5, None);
        assert!(c.is_complete());
        assert_eq!(c.position(), 12);
    }

    #[test]
    fn empty_constructed_closes_immediately() {
        let mut c = Container::<HostAddress>::new();
        c.advance(2, Some(4));
        c.advance(2, Some(0));
        assert_eq!(c.depth(), 1);
        assert_eq!(c.remaining(), Some(2));
    }

    #[test]
    fn unfinished_container_has_no_target() {
        let c = Container::<HostAddress>::new();
        assert!(matches!(
            c.finish(),
            Err(DecodeError::PrematureEnd { grammar: "HostAddress", .. })
        ));
    }
}
