use crate::error::CompileError;

use core::cell::RefCell;

/// A handler with which you can emit diagnostics.
///
/// Code generation reports an error for the unit that failed and carries on with the next one,
/// so the handler only accumulates; it never aborts.
#[derive(Default, Debug)]
pub struct Handler {
    inner: RefCell<HandlerInner>,
}

#[derive(Default, Debug)]
struct HandlerInner {
    errors: Vec<CompileError>,
}

impl Handler {
    /// Emit the error `err`.
    pub fn emit_err(&self, err: CompileError) -> ErrorEmitted {
        self.inner.borrow_mut().errors.push(err);
        ErrorEmitted { _priv: () }
    }

    pub fn has_errors(&self) -> bool {
        !self.inner.borrow().errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.inner.borrow().errors.len()
    }

    /// Extract all the errors from this handler.
    pub fn consume(self) -> Vec<CompileError> {
        self.inner.into_inner().errors
    }
}

/// Proof that an error was emitted through a `Handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorEmitted {
    _priv: (),
}
