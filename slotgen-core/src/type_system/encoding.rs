/// Where the significant bytes of a sub-word value sit within its byte window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Significant bytes at the high end, e.g. fixed-size byte sequences.
    Left,
    /// Significant bytes at the low end, e.g. integers.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
    NotApplicable,
}

/// How the stack representation of a value differs from its packed storage representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueRepr {
    /// The packed bytes are the stack value.
    Plain,
    /// Fixed-point numbers have no packed storage encoding yet.
    FixedPoint,
    /// A code tag; zero is replaced by the uninitialised-function tag on read.
    InternalFunction,
    /// Two stack slots (address, selector) packed into 24 bytes.
    ExternalFunction,
}

/// The packed encoding of a value type, as decided by the type system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueEncoding {
    pub bytes: u8,
    pub alignment: Alignment,
    pub signedness: Signedness,
    pub repr: ValueRepr,
}

impl ValueEncoding {
    pub fn plain(bytes: u8, alignment: Alignment, signedness: Signedness) -> Self {
        ValueEncoding {
            bytes,
            alignment,
            signedness,
            repr: ValueRepr::Plain,
        }
    }

    pub fn is_full_word(&self) -> bool {
        self.bytes == 32
    }

    pub fn is_signed(&self) -> bool {
        self.signedness == Signedness::Signed
    }
}
