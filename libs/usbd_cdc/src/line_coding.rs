//! Serial line configuration exchanged through SET_LINE_CODING / GET_LINE_CODING
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::{Error, Result};

/// Number of stop bits (`bCharFormat`)
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive)]
pub enum StopBits {
    One = 0,
    OnePointFive = 1,
    Two = 2,
}

/// Parity type (`bParityType`)
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive)]
pub enum ParityType {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

/// Line coding as defined in Section 6.3.11 of the PSTN subclass specification.
///
/// On the wire this is 7 bytes: `dwDTERate` (little endian), `bCharFormat`,
/// `bParityType` and `bDataBits`.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct LineCoding {
    /// Data terminal rate, in bits per second
    pub bitrate: u32,
    pub format: StopBits,
    pub parity_type: ParityType,
    /// 5, 6, 7, 8 or 16
    pub data_bits: u8,
}

impl LineCoding {
    pub const BYTES: usize = 7;

    /// 115200 8N1
    pub const DEFAULT: LineCoding =
        LineCoding { bitrate: 115_200, format: StopBits::One, parity_type: ParityType::None, data_bits: 8 };

    pub fn parse(buf: &[u8]) -> Result<LineCoding> {
        if buf.len() < Self::BYTES {
            return Err(Error::InvalidLength);
        }
        let format = StopBits::from_u8(buf[4]).ok_or(Error::InvalidLineCoding)?;
        let parity_type = ParityType::from_u8(buf[5]).ok_or(Error::InvalidLineCoding)?;
        Ok(LineCoding {
            bitrate: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            format,
            parity_type,
            data_bits: buf[6],
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let rate = self.bitrate.to_le_bytes();
        [rate[0], rate[1], rate[2], rate[3], self.format as u8, self.parity_type as u8, self.data_bits]
    }
}

impl Default for LineCoding {
    fn default() -> Self { LineCoding::DEFAULT }
}
