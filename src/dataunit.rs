//! Support for the EBU data unit syntax in which teletext packets are carried within a PES
//! payload, per _ETSI EN 300 472_.
//!
//! A PES payload holds a one-byte `data_identifier` followed by a sequence of data units.  Each
//! unit is a `data_unit_id` byte, a `data_unit_length` byte (always 44 for teletext), and a
//! 44-byte block: two bytes of framing (field parity, line offset and the framing code), a
//! 16-bit packet address, and the 40-byte teletext packet payload.
//!
//! The magazine and packet numbers within the address field are transmitted with each bit in
//! triplicate for error resilience; the weighted-bit extraction in
//! [`DataUnit::magazine()`](struct.DataUnit.html#method.magazine) and
//! [`DataUnit::packet_number()`](struct.DataUnit.html#method.packet_number) reconstructs the
//! values from the designated bit positions.

use std::fmt;

/// Identifies the kind of data carried by one data unit.  Several kinds are commonly multiplexed
/// on a single teletext PID; only
/// [`EbuTeletextSubtitle`](#variant.EbuTeletextSubtitle) units carry subtitle content.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DataUnitId {
    /// `EBU Teletext non-subtitle data`
    EbuTeletextNonSubtitle,
    /// `EBU Teletext subtitle data`
    EbuTeletextSubtitle,
    /// `VPS` (Video Programming System)
    Vps,
    /// `WSS` (Wide Screen Signalling)
    Wss,
    /// `Closed Captioning`
    ClosedCaptioning,
    /// `stuffing`
    Stuffing,
    /// Encapsulates a data_unit_id value not specified in _ETSI EN 300 472_ / _ETSI EN 301 775_
    Reserved(u8),
}
impl From<u8> for DataUnitId {
    fn from(v: u8) -> Self {
        match v {
            0x02 => DataUnitId::EbuTeletextNonSubtitle,
            0x03 => DataUnitId::EbuTeletextSubtitle,
            0xc3 => DataUnitId::Vps,
            0xc4 => DataUnitId::Wss,
            0xc5 => DataUnitId::ClosedCaptioning,
            0xff => DataUnitId::Stuffing,
            _ => DataUnitId::Reserved(v),
        }
    }
}

/// Problems encountered while walking the data units of a PES payload.
#[derive(Debug, PartialEq, Eq)]
pub enum DataUnitError {
    /// The buffer ended before a complete syntax element could be read.
    NotEnoughData {
        /// the name of the syntax element being read
        field: &'static str,
        /// the number of bytes required
        expected: usize,
        /// the number of bytes present
        actual: usize,
    },
    /// A `data_unit_length` other than the 44 bytes required for teletext data was found,
    /// which makes the position of any following unit unreliable.
    UnsupportedUnitLength(u8),
}

/// Borrowing wrapper around the 44-byte block of a single data unit.
pub struct DataUnit<'buf> {
    id: DataUnitId,
    buf: &'buf [u8],
}
impl<'buf> DataUnit<'buf> {
    /// The `data_unit_length` value required for teletext data units.
    pub const BLOCK_LEN: usize = 44;
    /// The length of the teletext packet payload within each unit.
    pub const PAYLOAD_LEN: usize = 40;

    fn new(id: DataUnitId, buf: &'buf [u8]) -> DataUnit<'buf> {
        assert_eq!(buf.len(), Self::BLOCK_LEN);
        DataUnit { id, buf }
    }

    /// The kind of data this unit carries.
    pub fn data_unit_id(&self) -> DataUnitId {
        self.id
    }
    /// Indicates which field of an interlaced frame the original VBI line belonged to.
    pub fn field_parity(&self) -> bool {
        self.buf[0] & 0b0010_0000 != 0
    }
    /// The VBI line number the packet was carried on, or zero if undefined.
    pub fn line_offset(&self) -> u8 {
        self.buf[0] & 0b0001_1111
    }
    /// The framing code byte (`0xE4` for standard teletext).
    pub fn framing_code(&self) -> u8 {
        self.buf[1]
    }
    /// The magazine number, reconstructed from its triplicated bits in the address field.
    ///
    /// A transmitted value of 0 denotes magazine 8 by convention, and is remapped here.
    pub fn magazine(&self) -> u8 {
        let addr = self.address();
        let magazine = bit(addr, 14) + 2 * bit(addr, 12) + 4 * bit(addr, 10);
        if magazine == 0 {
            8
        } else {
            magazine
        }
    }
    /// The packet number, reconstructed from its triplicated bits in the address field:
    /// 0 is a page header, 1 to 25 are display rows, higher values carry enhancement data.
    pub fn packet_number(&self) -> u8 {
        let addr = self.address();
        bit(addr, 8) + 2 * bit(addr, 6) + 4 * bit(addr, 4) + 8 * bit(addr, 2) + 16 * bit(addr, 0)
    }
    /// The 40-byte teletext packet payload.
    pub fn payload(&self) -> &'buf [u8] {
        &self.buf[4..]
    }

    fn address(&self) -> u16 {
        u16::from(self.buf[2]) << 8 | u16::from(self.buf[3])
    }
}
impl<'buf> fmt::Debug for DataUnit<'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("DataUnit")
            .field("data_unit_id", &self.data_unit_id())
            .field("magazine", &self.magazine())
            .field("packet_number", &self.packet_number())
            .finish()
    }
}

fn bit(value: u16, position: u8) -> u8 {
    ((value >> position) & 1) as u8
}

/// Iterator over the data units within one PES payload.
#[derive(Debug)]
pub struct DataUnitIter<'buf> {
    buf: &'buf [u8],
}
impl<'buf> DataUnitIter<'buf> {
    /// Creates an iterator over the data units of the given PES payload, whose leading
    /// `data_identifier` byte must still be present.
    pub fn new(data: &'buf [u8]) -> Result<DataUnitIter<'buf>, DataUnitError> {
        if data.is_empty() {
            return Err(DataUnitError::NotEnoughData {
                field: "data_identifier",
                expected: 1,
                actual: 0,
            });
        }
        Ok(DataUnitIter { buf: &data[1..] })
    }
}
impl<'buf> Iterator for DataUnitIter<'buf> {
    type Item = Result<DataUnit<'buf>, DataUnitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < 2 {
            let actual = self.buf.len();
            // ensure another call to next() will yield None,
            self.buf = &self.buf[0..0];
            return Some(Err(DataUnitError::NotEnoughData {
                field: "data_unit_header",
                expected: 2,
                actual,
            }));
        }
        let id = DataUnitId::from(self.buf[0]);
        let len = self.buf[1];
        if usize::from(len) != DataUnit::BLOCK_LEN {
            self.buf = &self.buf[0..0];
            return Some(Err(DataUnitError::UnsupportedUnitLength(len)));
        }
        if self.buf.len() < 2 + DataUnit::BLOCK_LEN {
            let actual = self.buf.len();
            self.buf = &self.buf[0..0];
            return Some(Err(DataUnitError::NotEnoughData {
                field: "data_unit",
                expected: 2 + DataUnit::BLOCK_LEN,
                actual,
            }));
        }
        let (unit, tail) = self.buf[2..].split_at(DataUnit::BLOCK_LEN);
        self.buf = tail;
        Some(Ok(DataUnit::new(id, unit)))
    }
}

/// Encodes an address field for test fixtures, placing each magazine bit at positions
/// {14,12,10} and each packet-number bit at positions {8,6,4,2,0}.
#[cfg(test)]
pub(crate) fn encode_address(magazine: u8, packet_number: u8) -> [u8; 2] {
    let mut addr = 0u16;
    for (i, position) in [14, 12, 10].iter().enumerate() {
        addr |= u16::from(magazine >> i & 1) << position;
    }
    for (i, position) in [8, 6, 4, 2, 0].iter().enumerate() {
        addr |= u16::from(packet_number >> i & 1) << position;
    }
    [(addr >> 8) as u8, addr as u8]
}

/// Assembles a complete data unit (id, length and 44-byte block) for test fixtures.
#[cfg(test)]
pub(crate) fn encode_unit(id: u8, magazine: u8, packet_number: u8, payload: &[u8]) -> Vec<u8> {
    assert_eq!(payload.len(), DataUnit::PAYLOAD_LEN);
    // field_parity set, line_offset 11, standard framing code
    let mut data = vec![id, DataUnit::BLOCK_LEN as u8, 0b0010_1011, 0xe4];
    data.extend_from_slice(&encode_address(magazine, packet_number));
    data.extend_from_slice(payload);
    data
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn subtitle_unit() {
        let payload = [0u8; 40];
        let mut data = vec![0x10]; // data_identifier
        data.extend_from_slice(&encode_unit(0x03, 2, 5, &payload));
        let mut iter = DataUnitIter::new(&data).unwrap();
        let unit = iter.next().unwrap().unwrap();
        assert_eq!(DataUnitId::EbuTeletextSubtitle, unit.data_unit_id());
        assert_eq!(2, unit.magazine());
        assert_eq!(5, unit.packet_number());
        assert_eq!(40, unit.payload().len());
        assert!(unit.field_parity());
        assert_eq!(11, unit.line_offset());
        assert_eq!(0xe4, unit.framing_code());
        assert_matches!(iter.next(), None);
    }

    #[test]
    fn magazine_zero_remapped() {
        let data: Vec<u8> = std::iter::once(0x10)
            .chain(encode_unit(0x03, 0, 0, &[0u8; 40]))
            .collect();
        let mut iter = DataUnitIter::new(&data).unwrap();
        let unit = iter.next().unwrap().unwrap();
        assert_eq!(8, unit.magazine());
        assert_eq!(0, unit.packet_number());
    }

    #[test]
    fn multiple_units() {
        let mut data = vec![0x10];
        data.extend_from_slice(&encode_unit(0xff, 0, 0, &[0u8; 40]));
        data.extend_from_slice(&encode_unit(0x03, 1, 0, &[0u8; 40]));
        let ids: Vec<_> = DataUnitIter::new(&data)
            .unwrap()
            .map(|u| u.unwrap().data_unit_id())
            .collect();
        assert_eq!(
            vec![DataUnitId::Stuffing, DataUnitId::EbuTeletextSubtitle],
            ids
        );
    }

    #[test]
    fn bad_unit_length() {
        let data = [0x10, 0x03, 43, 0, 0];
        let mut iter = DataUnitIter::new(&data).unwrap();
        assert_matches!(
            iter.next(),
            Some(Err(DataUnitError::UnsupportedUnitLength(43)))
        );
        assert_matches!(iter.next(), None);
    }

    #[test]
    fn truncated_unit() {
        let data = [0x10, 0x03, 44, 0, 0, 0];
        let mut iter = DataUnitIter::new(&data).unwrap();
        assert_matches!(
            iter.next(),
            Some(Err(DataUnitError::NotEnoughData {
                field: "data_unit",
                ..
            }))
        );
        assert_matches!(iter.next(), None);
    }

    #[test]
    fn empty_payload() {
        assert_matches!(
            DataUnitIter::new(&[]),
            Err(DataUnitError::NotEnoughData {
                field: "data_identifier",
                ..
            })
        );
    }
}
