//! The element stack.
//!
//! Index 0 holds a sentinel frame standing for the document itself. It is
//! never popped, so closing with no element open is detected rather than
//! underflowing. In namespace-aware mode the sentinel owns the built-in
//! prefix bindings.

use crate::namespace::{PrefixDelta, PrefixTable};
use crate::util::qname::QualifiedName;

/// One open element.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) name: QualifiedName,
    /// Whether the caller announced child elements (drives indentation).
    pub(crate) has_children: bool,
    /// Prefix bindings this element introduced, in declaration order.
    pub(crate) deltas: Vec<PrefixDelta>,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementStack {
    frames: Vec<Frame>,
}

impl ElementStack {
    pub(crate) fn new(namespace_aware: bool) -> Self {
        let sentinel = Frame {
            name: QualifiedName::default(),
            has_children: true,
            deltas: if namespace_aware {
                PrefixTable::builtin_deltas()
            } else {
                Vec::new()
            },
        };
        Self {
            frames: vec![sentinel],
        }
    }

    /// Number of open elements.
    pub(crate) fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// The innermost frame, which is the sentinel when nothing is open.
    pub(crate) fn current(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    pub(crate) fn current_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// The innermost open element, excluding the sentinel.
    pub(crate) fn innermost_open(&self) -> Option<&Frame> {
        self.frames.get(1..).and_then(<[Frame]>::last)
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pops the innermost open element. Returns `None` instead of popping
    /// the sentinel.
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Prefix deltas of every remaining frame, sentinel first.
    pub(crate) fn scopes(&self) -> impl Iterator<Item = &[PrefixDelta]> + '_ {
        self.frames.iter().map(|frame| frame.deltas.as_slice())
    }
}
