//! Reserve a placeholder, emit the section, then patch the placeholder
//!
//! Class files are full of counts and byte lengths that precede the data they describe: the
//! constant pool count, the interface/field/method/attribute counts, attribute lengths and the
//! code length inside `Code` attributes. Since the assembler emits strictly front to back, each
//! of these is handled the same way:
//!
//!   1. [`ByteSink::begin_section`] writes a zeroed placeholder and returns a [`SectionHandle`]
//!   2. entries are emitted (and, for counts, recorded on the handle)
//!   3. [`ByteSink::end_section`] consumes the handle and patches the placeholder
//!

use super::ByteSink;
use crate::jvm::Error;

/// What gets patched into the reserved field once the section ends
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SectionKind {
    /// `u2` number of entries recorded on the handle
    Count,

    /// `u4` number of bytes emitted after the placeholder
    Length,
}

impl SectionKind {
    /// Width in bytes of the reserved field
    pub fn width(self) -> usize {
        match self {
            SectionKind::Count => 2,
            SectionKind::Length => 4,
        }
    }
}

/// Offset of a reserved field which has not yet been patched
#[derive(Debug)]
pub struct PendingField {
    offset: usize,
    kind: SectionKind,
}

impl PendingField {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.kind.width()
    }
}

/// Section whose size field is pending
///
/// Consumed by [`ByteSink::end_section`], which patches the placeholder.
#[derive(Debug)]
#[must_use = "a section must be closed with `ByteSink::end_section`"]
pub struct SectionHandle {
    field: PendingField,

    /// Entries recorded so far (only meaningful for `SectionKind::Count`)
    tally: u32,
}

impl SectionHandle {
    pub fn kind(&self) -> SectionKind {
        self.field.kind
    }

    pub fn field(&self) -> &PendingField {
        &self.field
    }

    /// Offset of the first byte after the placeholder
    pub fn body_start(&self) -> usize {
        self.field.offset + self.field.width()
    }

    /// Start the tally somewhere other than 0 (the constant pool count starts at 1)
    pub fn starting_at(mut self, tally: u16) -> SectionHandle {
        self.tally = tally as u32;
        self
    }

    /// Current value of the tally
    pub fn tally(&self) -> u32 {
        self.tally
    }

    /// Record `entries` more entries, returning the tally _before_ they were added
    ///
    /// Fails without changing the tally if the result would no longer fit in a `u2`.
    pub fn record_entries(&mut self, entries: u32) -> Result<u32, Error> {
        let previous = self.tally;
        self.tally = self.tally_after(entries)?;
        Ok(previous)
    }

    /// Tally once `entries` more entries are recorded, without recording them
    pub fn tally_after(&self, entries: u32) -> Result<u32, Error> {
        let updated = self.tally.saturating_add(entries);
        if updated > u16::MAX as u32 {
            return Err(Error::SectionOverflow {
                kind: SectionKind::Count,
                value: updated as u64,
            });
        }
        Ok(updated)
    }
}

impl ByteSink {
    /// Reserve the size field of a new section at the current position
    pub fn begin_section(&mut self, kind: SectionKind) -> Result<SectionHandle, Error> {
        let offset = self.position();
        match kind {
            SectionKind::Count => self.emit_u2(0)?,
            SectionKind::Length => self.emit_u4(0)?,
        }
        Ok(SectionHandle {
            field: PendingField { offset, kind },
            tally: 0,
        })
    }

    /// Patch the size field of a section, returning the value written
    pub fn end_section(&mut self, handle: SectionHandle) -> Result<u32, Error> {
        match handle.field.kind {
            SectionKind::Count => {
                self.patch_u2(handle.field.offset, handle.tally as u16)?;
                Ok(handle.tally)
            }
            SectionKind::Length => {
                let span = self.position() - handle.body_start();
                let length = u32::try_from(span).map_err(|_| Error::SectionOverflow {
                    kind: SectionKind::Length,
                    value: span as u64,
                })?;
                self.patch_u4(handle.field.offset, length)?;
                Ok(length)
            }
        }
    }
}
