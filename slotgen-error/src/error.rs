use slotgen_types::{Span, Spanned};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompileError {
    #[error(
        "Stack too deep: the accessed value is {depth} slots below the top of the stack, but \
         only the top 16 slots can be addressed. Try removing local variables or splitting the \
         expression."
    )]
    StackTooDeep { depth: usize, span: Span },
    #[error("Unimplemented feature: {0}")]
    Unimplemented(&'static str, Span),
    #[error(
        "Unimplemented feature: {0}\n\
         help: {1}.\n\
         "
    )]
    UnimplementedWithHelp(&'static str, &'static str, Span),
}

impl CompileError {
    /// Whether the error reports a construct that is valid but not supported yet, as opposed to
    /// a resource limit being hit.
    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            CompileError::Unimplemented(..) | CompileError::UnimplementedWithHelp(..)
        )
    }
}

impl Spanned for CompileError {
    fn span(&self) -> Span {
        use CompileError::*;
        match self {
            StackTooDeep { span, .. } => span.clone(),
            Unimplemented(_, span) => span.clone(),
            UnimplementedWithHelp(_, _, span) => span.clone(),
        }
    }
}
