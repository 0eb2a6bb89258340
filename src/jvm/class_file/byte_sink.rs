use crate::jvm::Error;
use byteorder::{BigEndian, ByteOrder};

/// Append-only byte buffer that class files are emitted into
///
/// Bytes only ever get appended at the cursor (which is always the current length). The one
/// exception is patching: fields whose value is only known once their section is complete (counts
/// and lengths) get reserved up front and overwritten in place later. Patches never move the
/// cursor.
#[derive(Debug, Clone)]
pub struct ByteSink {
    bytes: Vec<u8>,
    capacity: usize,
}

impl ByteSink {
    /// Size of the output buffer used when nothing else is configured
    pub const DEFAULT_CAPACITY: usize = 65536;

    /// Make an empty sink which refuses to grow past `capacity` bytes
    pub fn new(capacity: usize) -> ByteSink {
        ByteSink {
            bytes: Vec::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Make an empty sink with no meaningful capacity limit (used for scratch encodings)
    pub fn unbounded() -> ByteSink {
        ByteSink {
            bytes: vec![],
            capacity: usize::MAX,
        }
    }

    /// Offset at which the next byte will be written
    pub fn position(&self) -> usize {
        self.bytes.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn emit_u1(&mut self, value: u8) -> Result<(), Error> {
        self.emit_bytes(&[value])
    }

    pub fn emit_u2(&mut self, value: u16) -> Result<(), Error> {
        let mut buffer = [0; 2];
        BigEndian::write_u16(&mut buffer, value);
        self.emit_bytes(&buffer)
    }

    pub fn emit_u4(&mut self, value: u32) -> Result<(), Error> {
        let mut buffer = [0; 4];
        BigEndian::write_u32(&mut buffer, value);
        self.emit_bytes(&buffer)
    }

    /// Append raw bytes
    ///
    /// Either all of `bytes` are written or none of them are.
    pub fn emit_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let position = self.position();
        match position.checked_add(bytes.len()) {
            Some(end) if end <= self.capacity => {
                self.bytes.extend_from_slice(bytes);
                Ok(())
            }
            _ => Err(Error::BufferCapacityExceeded {
                capacity: self.capacity,
                position,
                requested: bytes.len(),
            }),
        }
    }

    /// Overwrite two previously emitted bytes at `offset`
    pub fn patch_u2(&mut self, offset: usize, value: u16) -> Result<(), Error> {
        let target = self.written_range(offset, 2)?;
        BigEndian::write_u16(target, value);
        Ok(())
    }

    /// Overwrite four previously emitted bytes at `offset`
    pub fn patch_u4(&mut self, offset: usize, value: u32) -> Result<(), Error> {
        let target = self.written_range(offset, 4)?;
        BigEndian::write_u32(target, value);
        Ok(())
    }

    fn written_range(&mut self, offset: usize, width: usize) -> Result<&mut [u8], Error> {
        let written = self.bytes.len();
        match offset.checked_add(width) {
            Some(end) if end <= written => Ok(&mut self.bytes[offset..end]),
            _ => Err(Error::InvalidPatchOffset {
                offset,
                width,
                written,
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Drop everything written so far (the capacity is kept)
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for ByteSink {
    fn default() -> ByteSink {
        ByteSink::new(ByteSink::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_big_endian() {
        let mut sink = ByteSink::default();
        sink.emit_u1(0xAB).unwrap();
        sink.emit_u2(0x1024).unwrap();
        sink.emit_u4(0x1234_5678).unwrap();
        assert_eq!(sink.as_bytes(), &[0xAB, 0x10, 0x24, 0x12, 0x34, 0x56, 0x78]);
        assert_eq!(sink.position(), 7);
    }

    #[test]
    fn patches_do_not_move_the_cursor() {
        let mut sink = ByteSink::default();
        sink.emit_u2(0).unwrap();
        sink.emit_u4(0).unwrap();
        sink.emit_u1(0xFF).unwrap();
        sink.patch_u2(0, 0xBEEF).unwrap();
        sink.patch_u4(2, 0xCAFE_BABE).unwrap();
        assert_eq!(sink.position(), 7);
        assert_eq!(
            sink.as_bytes(),
            &[0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE, 0xFF]
        );
    }

    #[test]
    fn patch_outside_written_range() {
        let mut sink = ByteSink::default();
        sink.emit_u2(0).unwrap();
        sink.emit_u1(0).unwrap();
        assert!(matches!(
            sink.patch_u2(2, 1),
            Err(Error::InvalidPatchOffset {
                offset: 2,
                width: 2,
                written: 3
            })
        ));
        assert!(matches!(
            sink.patch_u4(0, 1),
            Err(Error::InvalidPatchOffset { .. })
        ));
        assert!(matches!(
            sink.patch_u2(usize::MAX, 1),
            Err(Error::InvalidPatchOffset { .. })
        ));
        assert_eq!(sink.as_bytes(), &[0, 0, 0]);
    }

    #[test]
    fn capacity_is_enforced_without_partial_writes() {
        let mut sink = ByteSink::new(5);
        sink.emit_u4(1).unwrap();
        let err = sink.emit_u2(2).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferCapacityExceeded {
                capacity: 5,
                position: 4,
                requested: 2
            }
        ));
        assert!(err.is_fatal());
        assert_eq!(sink.position(), 4);
        sink.emit_u1(3).unwrap();
        assert!(sink.emit_u1(4).is_err());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut sink = ByteSink::new(2);
        sink.emit_u2(7).unwrap();
        sink.clear();
        assert_eq!(sink.position(), 0);
        assert_eq!(sink.capacity(), 2);
        sink.emit_u2(8).unwrap();
    }
}
