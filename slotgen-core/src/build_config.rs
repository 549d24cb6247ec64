/// Configuration for code generation of location value accesses.
#[derive(Clone, Debug, Default)]
pub struct BuildConfig {
    pub(crate) print_intermediate_asm: bool,
    pub(crate) print_finalized_asm: bool,
}

impl BuildConfig {
    /// Log the abstract instruction listing of every compiled unit.
    pub fn print_intermediate_asm(self, a: bool) -> Self {
        Self {
            print_intermediate_asm: a,
            ..self
        }
    }

    /// Log the lowered assembler ops produced by finalization.
    pub fn print_finalized_asm(self, a: bool) -> Self {
        Self {
            print_finalized_asm: a,
            ..self
        }
    }
}
