use super::{ByteSink, Version};

/// Knobs for a [`ClassAssembler`](super::ClassAssembler)
#[derive(Clone, Debug)]
pub struct AssemblerSettings {
    /// Version written into the class file header
    pub version: Version,

    /// Maximum size in bytes of the emitted class file
    pub capacity: usize,

    /// Make `Long` and `Double` constants advance the constant pool index by two
    ///
    /// Off by default: every constant then advances the index by exactly one, which callers
    /// that precompute their indices rely on.
    pub wide_constants_take_two_slots: bool,
}

impl Default for AssemblerSettings {
    fn default() -> AssemblerSettings {
        AssemblerSettings {
            version: Version::JAVA8,
            capacity: ByteSink::DEFAULT_CAPACITY,
            wide_constants_take_two_slots: false,
        }
    }
}
