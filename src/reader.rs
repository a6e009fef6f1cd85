//! Bounds-checked cursor over an input slice.

use crate::string_table::IndexWidth;
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};

/// Forward-only reader. Every read either returns the requested bytes or a
/// [`Error::ContainerTooSmall`]; it never reads past the slice.
pub(crate) struct Reader<'de> {
    input: &'de [u8],
}

impl<'de> Reader<'de> {
    pub(crate) fn new(input: &'de [u8]) -> Self {
        Reader { input }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Consumes the reader, returning the unread bytes.
    pub(crate) fn rest(self) -> &'de [u8] {
        self.input
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let available = self.input.len();
        self.input
            .read_u8()
            .map_err(|_| Error::container_too_small(1, available))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let available = self.input.len();
        self.input
            .read_u32::<LittleEndian>()
            .map_err(|_| Error::container_too_small(4, available))
    }

    pub(crate) fn read_index(&mut self, width: IndexWidth) -> Result<u32> {
        let available = self.input.len();
        let value = match width {
            IndexWidth::One => self.input.read_u8().map(u32::from),
            IndexWidth::Two => self.input.read_u16::<LittleEndian>().map(u32::from),
            IndexWidth::Four => self.input.read_u32::<LittleEndian>(),
        };
        value.map_err(|_| Error::container_too_small(width.bytes() as u64, available))
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'de [u8]> {
        if len > self.input.len() {
            return Err(Error::container_too_small(len as u64, self.input.len()));
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let mut reader = Reader::new(&[0x01, 0x02, 0x00, 0x00, 0x00, 0xff]);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.rest(), &[0xff]);
    }

    #[test]
    fn test_short_reads_fail() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        assert!(matches!(
            reader.read_u32(),
            Err(Error::ContainerTooSmall { needed: 4, .. })
        ));

        let mut reader = Reader::new(&[0x01, 0x02]);
        assert!(reader.take(3).is_err());
        assert_eq!(reader.take(2).unwrap(), &[0x01, 0x02]);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn test_index_widths() {
        let mut reader = Reader::new(&[0x05, 0x34, 0x12, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(reader.read_index(IndexWidth::One).unwrap(), 5);
        assert_eq!(reader.read_index(IndexWidth::Two).unwrap(), 0x1234);
        assert_eq!(reader.read_index(IndexWidth::Four).unwrap(), 1);
    }
}
