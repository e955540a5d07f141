// Thu Aug 27 2026 - Alex

use crate::memory::RegionKind;
use crate::proto::{ProtoError, ValueType};
use crate::scan::Occurrence;
use bytes::{Buf, BufMut};

/// Wire tag for each command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Write = 1,
    Read = 2,
    Dump = 3,
    Find = 4,
    Ack = 5,
    FindAck = 6,
}

impl CommandId {
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    pub fn from_u16(value: u16) -> Result<Self, ProtoError> {
        match value {
            1 => Ok(Self::Write),
            2 => Ok(Self::Read),
            3 => Ok(Self::Dump),
            4 => Ok(Self::Find),
            5 => Ok(Self::Ack),
            6 => Ok(Self::FindAck),
            other => Err(ProtoError::UnknownCommand(other)),
        }
    }
}

/// A decoded command body. `Find` carries the raw search bytes plus their
/// declared type; `FindAck` carries both back alongside the occurrences so
/// the requesting side can render results without extra state.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Write { offset: u64 },
    Read { offset: u64 },
    Dump,
    Find { value_type: ValueType, value: Vec<u8> },
    Ack,
    FindAck {
        value_type: ValueType,
        value: Vec<u8>,
        occurrences: Vec<Occurrence>,
    },
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Self::Write { .. } => CommandId::Write,
            Self::Read { .. } => CommandId::Read,
            Self::Dump => CommandId::Dump,
            Self::Find { .. } => CommandId::Find,
            Self::Ack => CommandId::Ack,
            Self::FindAck { .. } => CommandId::FindAck,
        }
    }
}

/// One self-describing message: a command id tag followed by the variant
/// body. This is the payload the framing layer treats as opaque bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub command: Command,
}

impl Envelope {
    pub fn new(command: Command) -> Self {
        Self { command }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u16_le(self.command.id().to_u16());

        match &self.command {
            Command::Write { offset } | Command::Read { offset } => {
                buf.put_u64_le(*offset);
            }
            Command::Dump | Command::Ack => {}
            Command::Find { value_type, value } => {
                buf.put_u8(value_type.to_u8());
                put_bytes(&mut buf, value);
            }
            Command::FindAck {
                value_type,
                value,
                occurrences,
            } => {
                buf.put_u8(value_type.to_u8());
                put_bytes(&mut buf, value);
                buf.put_u32_le(occurrences.len() as u32);
                for occurrence in occurrences {
                    buf.put_u64_le(occurrence.base_address);
                    buf.put_u64_le(occurrence.offset);
                    buf.put_u64_le(occurrence.region_size);
                    buf.put_u64_le(occurrence.data_size);
                    buf.put_u8(occurrence.kind.to_u8());
                }
            }
        }

        buf
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self, ProtoError> {
        let id = CommandId::from_u16(get_u16(&mut bytes)?)?;

        let command = match id {
            CommandId::Write => Command::Write {
                offset: get_u64(&mut bytes)?,
            },
            CommandId::Read => Command::Read {
                offset: get_u64(&mut bytes)?,
            },
            CommandId::Dump => Command::Dump,
            CommandId::Ack => Command::Ack,
            CommandId::Find => Command::Find {
                value_type: ValueType::from_u8(get_u8(&mut bytes)?)?,
                value: get_bytes(&mut bytes)?,
            },
            CommandId::FindAck => {
                let value_type = ValueType::from_u8(get_u8(&mut bytes)?)?;
                let value = get_bytes(&mut bytes)?;
                let count = get_u32(&mut bytes)? as usize;
                let mut occurrences = Vec::with_capacity(count.min(1 << 20));
                for _ in 0..count {
                    let base_address = get_u64(&mut bytes)?;
                    let offset = get_u64(&mut bytes)?;
                    let region_size = get_u64(&mut bytes)?;
                    let data_size = get_u64(&mut bytes)?;
                    let kind_raw = get_u8(&mut bytes)?;
                    occurrences.push(Occurrence {
                        base_address,
                        offset,
                        region_size,
                        data_size,
                        kind: RegionKind::from_u8(kind_raw)
                            .ok_or(ProtoError::UnknownRegionKind(kind_raw))?,
                    });
                }
                Command::FindAck {
                    value_type,
                    value,
                    occurrences,
                }
            }
        };

        Ok(Self { command })
    }
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.put_u32_le(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn get_u8(buf: &mut &[u8]) -> Result<u8, ProtoError> {
    if buf.remaining() < 1 {
        return Err(ProtoError::Truncated);
    }
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut &[u8]) -> Result<u16, ProtoError> {
    if buf.remaining() < 2 {
        return Err(ProtoError::Truncated);
    }
    Ok(buf.get_u16_le())
}

fn get_u32(buf: &mut &[u8]) -> Result<u32, ProtoError> {
    if buf.remaining() < 4 {
        return Err(ProtoError::Truncated);
    }
    Ok(buf.get_u32_le())
}

fn get_u64(buf: &mut &[u8]) -> Result<u64, ProtoError> {
    if buf.remaining() < 8 {
        return Err(ProtoError::Truncated);
    }
    Ok(buf.get_u64_le())
}

fn get_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, ProtoError> {
    let len = get_u32(buf)? as usize;
    if buf.remaining() < len {
        return Err(ProtoError::Truncated);
    }
    Ok(buf.copy_to_bytes(len).to_vec())
}
