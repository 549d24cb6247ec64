use std::{fmt, sync::Arc};

/// A region of source text, carried by every diagnostic so it can point at the access site that
/// triggered it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    src: Arc<str>,
    start: usize,
    end: usize,
}

impl Span {
    /// `None` when `start..end` is not a valid range of `src`.
    pub fn new(src: Arc<str>, start: usize, end: usize) -> Option<Span> {
        src.get(start..end)?;
        Some(Span { src, start, end })
    }

    /// A span that points nowhere, for code that has no source of its own.
    pub fn dummy() -> Span {
        Span {
            src: Arc::from(""),
            start: 0,
            end: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.src[self.start..self.end]
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Span")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("as_str", &self.as_str())
            .finish()
    }
}

pub trait Spanned {
    fn span(&self) -> Span;
}
