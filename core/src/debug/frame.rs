//! Frame encode/decode for the debug transport (§6): `{SYNC(0xA5), type,
//! length(2, big-endian), core, payload[length], CRC-8/MAXIM}`.

pub const SYNC_BYTE: u8 = 0xA5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Halt,
    Resume,
    StepMicrocode,
    StepBytecode,
    ReadRegisters,
    ReadStack,
    ReadMemory,
    WriteMemory,
    SetBreakpoint,
    ClearBreakpoint,
    QueryBreakpoint,
    Ping,
    QueryInfo,
}

impl Command {
    fn encode(self) -> u8 {
        match self {
            Command::Halt => 0,
            Command::Resume => 1,
            Command::StepMicrocode => 2,
            Command::StepBytecode => 3,
            Command::ReadRegisters => 4,
            Command::ReadStack => 5,
            Command::ReadMemory => 6,
            Command::WriteMemory => 7,
            Command::SetBreakpoint => 8,
            Command::ClearBreakpoint => 9,
            Command::QueryBreakpoint => 10,
            Command::Ping => 11,
            Command::QueryInfo => 12,
        }
    }

    fn decode(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Command::Halt,
            1 => Command::Resume,
            2 => Command::StepMicrocode,
            3 => Command::StepBytecode,
            4 => Command::ReadRegisters,
            5 => Command::ReadStack,
            6 => Command::ReadMemory,
            7 => Command::WriteMemory,
            8 => Command::SetBreakpoint,
            9 => Command::ClearBreakpoint,
            10 => Command::QueryBreakpoint,
            11 => Command::Ping,
            12 => Command::QueryInfo,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub core: u8,
    pub payload: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    Incomplete,
    BadSync,
    UnknownCommand(u8),
    CrcMismatch,
}

/// CRC-8/MAXIM: poly 0x31 reflected (0x8C), init 0x00, reflected in/out.
fn crc8_maxim(data: &[u8]) -> u8 {
    let mut crc: u8 = 0x00;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0x8C;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

impl Frame {
    pub fn encode(&self) -> Vec<u8> {
        let len = self.payload.len() as u16;
        let mut buf = Vec::with_capacity(6 + self.payload.len());
        buf.push(SYNC_BYTE);
        buf.push(self.command.encode());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(self.core);
        buf.extend_from_slice(&self.payload);
        let crc = crc8_maxim(&buf[1..]);
        buf.push(crc);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<(Frame, usize), FrameError> {
        if bytes.len() < 6 {
            return Err(FrameError::Incomplete);
        }
        if bytes[0] != SYNC_BYTE {
            return Err(FrameError::BadSync);
        }
        let command = Command::decode(bytes[1]).ok_or(FrameError::UnknownCommand(bytes[1]))?;
        let len = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        let core = bytes[4];
        let total = 6 + len;
        if bytes.len() < total {
            return Err(FrameError::Incomplete);
        }
        let payload = bytes[5..5 + len].to_vec();
        let crc_expected = bytes[total - 1];
        let crc_actual = crc8_maxim(&bytes[1..total - 1]);
        if crc_expected != crc_actual {
            return Err(FrameError::CrcMismatch);
        }
        Ok((
            Frame {
                command,
                core,
                payload,
            },
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_fields() {
        let frame = Frame {
            command: Command::ReadMemory,
            core: 2,
            payload: vec![0, 0, 0, 16],
        };
        let bytes = frame.encode();
        let (decoded, consumed) = Frame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let frame = Frame {
            command: Command::Ping,
            core: 0,
            payload: vec![],
        };
        let mut bytes = frame.encode();
        *bytes.last_mut().unwrap() ^= 0xFF;
        assert_eq!(Frame::decode(&bytes), Err(FrameError::CrcMismatch));
    }

    #[test]
    fn truncated_stream_reports_incomplete() {
        let frame = Frame {
            command: Command::Halt,
            core: 0,
            payload: vec![1, 2, 3],
        };
        let bytes = frame.encode();
        assert_eq!(Frame::decode(&bytes[..4]), Err(FrameError::Incomplete));
    }

    #[test]
    fn bad_sync_byte_is_rejected() {
        let bytes = [0x00, 0, 0, 0, 0, 0];
        assert_eq!(Frame::decode(&bytes), Err(FrameError::BadSync));
    }
}
