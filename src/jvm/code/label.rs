use crate::jvm::class_file::ByteSink;
use crate::jvm::Error;
use std::fmt;

/// Opaque label for a position in the code array of one `Code` attribute
///
/// Labels are handed out by [`LabelTable::fresh_label`] and only mean something to the table (and
/// so the `Code` attribute) which produced them.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Default)]
pub struct Label(u32);

impl Label {
    /// Get the next fresh label
    fn next(&self) -> Label {
        Label(self.0 + 1)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.0))
    }
}

/// Width of the relative offset operand of a jump
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum JumpWidth {
    /// Signed 16-bit offset (`goto`, `jsr`, `if*`)
    Narrow,

    /// Signed 32-bit offset (`goto_w`, `jsr_w`, switch targets)
    Wide,
}

impl JumpWidth {
    /// Check that a relative offset is representable in this width
    pub fn fits(self, offset: i64) -> bool {
        match self {
            JumpWidth::Narrow => i16::try_from(offset).is_ok(),
            JumpWidth::Wide => i32::try_from(offset).is_ok(),
        }
    }
}

/// Jump whose target label was not yet marked when the jump was emitted
///
/// The operand was emitted as a zeroed placeholder which gets patched once the label is marked.
/// Both positions are absolute offsets in the byte sink.
#[derive(Clone, Debug)]
pub struct Fixup {
    pub label: Label,

    /// Position of the opcode the offset is relative to
    pub opcode_position: usize,

    /// Position of the placeholder
    pub operand_position: usize,

    pub width: JumpWidth,

    /// Rendering of the jump instruction, for error messages
    pub instruction: String,
}

/// Labels of one `Code` attribute along with the jumps still waiting on them
#[derive(Debug, Default)]
pub struct LabelTable {
    /// Next label to hand out
    next_label: Label,

    /// Absolute sink position of every reserved label (`None` until it is marked)
    positions: Vec<Option<usize>>,

    /// Forward jumps not yet patched
    pending: Vec<Fixup>,
}

impl LabelTable {
    /// Generate a fresh unmarked label
    pub fn fresh_label(&mut self) -> Label {
        let to_return = self.next_label;
        self.next_label = self.next_label.next();
        self.positions.push(None);
        to_return
    }

    /// Sink position of a label, or `None` if it has not been marked yet
    pub fn position_of(&self, label: Label) -> Result<Option<usize>, Error> {
        self.positions
            .get(label.0 as usize)
            .copied()
            .ok_or(Error::UnknownLabel(label))
    }

    /// Register forward jumps emitted for an instruction
    pub fn add_fixups(&mut self, fixups: impl IntoIterator<Item = Fixup>) {
        self.pending.extend(fixups);
    }

    /// Mark `label` as being at sink position `position`, patching all jumps waiting on it
    ///
    /// If one of those jumps can't reach `position`, nothing is patched and the error is fatal:
    /// the label could only ever be marked further away.
    pub fn mark(&mut self, sink: &mut ByteSink, label: Label, position: usize) -> Result<(), Error> {
        if self.position_of(label)?.is_some() {
            return Err(Error::DuplicateLabel(label));
        }

        let mut resolved = vec![];
        for fixup in self.pending.iter().filter(|fixup| fixup.label == label) {
            let offset = position as i64 - fixup.opcode_position as i64;
            if !fixup.width.fits(offset) {
                return Err(Error::UnreachableLabel {
                    label,
                    instruction: fixup.instruction.clone(),
                    offset,
                });
            }
            resolved.push((fixup.operand_position, fixup.width, offset));
        }

        for (operand_position, width, offset) in resolved {
            match width {
                JumpWidth::Narrow => sink.patch_u2(operand_position, offset as i16 as u16)?,
                JumpWidth::Wide => sink.patch_u4(operand_position, offset as i32 as u32)?,
            }
        }
        self.pending.retain(|fixup| fixup.label != label);
        self.positions[label.0 as usize] = Some(position);
        log::trace!("Marked {:?} at {}", label, position);
        Ok(())
    }

    /// Some label which is the target of a jump but has not been marked
    pub fn first_unresolved(&self) -> Option<Label> {
        self.pending.first().map(|fixup| fixup.label)
    }
}
