use crate::version::{V1_13, V1_13_2, V1_14};
use bytes::{Buf, BufMut, BytesMut};
use quarry_nbt::{NbtError, NbtValue};
use quarry_types::{BlockPos, ItemStack};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too long")]
    VarIntTooLong,
    #[error("Not enough data")]
    NotEnoughData,
    #[error("String too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("NBT error: {0}")]
    Nbt(#[from] NbtError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Largest string any vanilla packet carries, in characters.
pub const MAX_STRING_LEN: usize = 32767;

/// Read a VarInt from the buffer.
pub fn read_varint(buf: &mut BytesMut) -> CodecResult<i32> {
    let mut result: i32 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooLong);
        }
    }
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut BytesMut, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Decode a VarInt from the front of a slice without consuming it.
/// Returns `Ok(None)` when the slice ends before the VarInt does, otherwise
/// the value and the number of bytes it occupies.
pub fn peek_varint(bytes: &[u8]) -> CodecResult<Option<(i32, usize)>> {
    let mut result: i32 = 0;
    for (i, byte) in bytes.iter().take(5).enumerate() {
        result |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((result, i + 1)));
        }
    }
    if bytes.len() >= 5 {
        Err(CodecError::VarIntTooLong)
    } else {
        Ok(None)
    }
}

/// Read a VarLong from the buffer.
pub fn read_varlong(buf: &mut BytesMut) -> CodecResult<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 70 {
            return Err(CodecError::VarIntTooLong);
        }
    }
}

/// Write a VarLong to the buffer.
pub fn write_varlong(buf: &mut BytesMut, mut value: i64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u64) >> 7) as i64;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

fn ensure(buf: &BytesMut, len: usize) -> CodecResult<()> {
    if buf.remaining() < len {
        Err(CodecError::NotEnoughData)
    } else {
        Ok(())
    }
}

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut BytesMut) -> CodecResult<i8> {
    ensure(buf, 1)?;
    Ok(buf.get_i8())
}

/// Any non-zero byte is true.
pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    Ok(read_u8(buf)? != 0)
}

pub fn read_u16(buf: &mut BytesMut) -> CodecResult<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    ensure(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_i32(buf: &mut BytesMut) -> CodecResult<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_i64(buf: &mut BytesMut) -> CodecResult<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64())
}

pub fn read_f32(buf: &mut BytesMut) -> CodecResult<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32())
}

pub fn read_f64(buf: &mut BytesMut) -> CodecResult<f64> {
    ensure(buf, 8)?;
    Ok(buf.get_f64())
}

/// Read a protocol string (varint-prefixed UTF-8).
pub fn read_string(buf: &mut BytesMut, max_len: usize) -> CodecResult<String> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::InvalidValue(format!("negative string length {}", len)));
    }
    let len = len as usize;
    if len > max_len * 4 {
        return Err(CodecError::StringTooLong(len, max_len));
    }
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a protocol string.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
}

/// Read a UUID (128 bits, big endian).
pub fn read_uuid(buf: &mut BytesMut) -> CodecResult<Uuid> {
    ensure(buf, 16)?;
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(Uuid::from_bytes(bytes))
}

/// Write a UUID.
pub fn write_uuid(buf: &mut BytesMut, uuid: &Uuid) {
    buf.put_slice(uuid.as_bytes());
}

/// Read a byte array with varint length prefix.
pub fn read_byte_array(buf: &mut BytesMut) -> CodecResult<Vec<u8>> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::InvalidValue(format!("negative array length {}", len)));
    }
    ensure(buf, len as usize)?;
    Ok(buf.split_to(len as usize).to_vec())
}

/// Write a byte array with varint length prefix.
pub fn write_byte_array(buf: &mut BytesMut, data: &[u8]) {
    write_varint(buf, data.len() as i32);
    buf.put_slice(data);
}

/// Consume everything left in the buffer.
pub fn read_remaining(buf: &mut BytesMut) -> Vec<u8> {
    buf.split().to_vec()
}

/// Read a packed block position. The bit layout changed in 1.14.
pub fn read_block_pos(buf: &mut BytesMut, protocol: u32) -> CodecResult<BlockPos> {
    let raw = read_i64(buf)? as u64;
    Ok(if protocol < V1_14 {
        BlockPos::decode_legacy(raw)
    } else {
        BlockPos::decode(raw)
    })
}

pub fn write_block_pos(buf: &mut BytesMut, pos: &BlockPos, protocol: u32) {
    let raw = if protocol < V1_14 {
        pos.encode_legacy()
    } else {
        pos.encode()
    };
    buf.put_u64(raw);
}

/// Read an optional NBT root. A single `TAG_END` byte means absent.
pub fn read_nbt(buf: &mut BytesMut) -> CodecResult<Option<NbtValue>> {
    Ok(NbtValue::read_root_named(buf)?.map(|(_, value)| value))
}

pub fn write_nbt(buf: &mut BytesMut, nbt: &Option<NbtValue>) {
    match nbt {
        Some(value) => value.write_root_named("", buf),
        None => buf.put_u8(quarry_nbt::TAG_END),
    }
}

/// Read an item slot. Three layouts exist:
/// before 1.13 `i16 id | i8 count | i16 damage | nbt`,
/// 1.13 to 1.13.1 `i16 id | i8 count | nbt`,
/// from 1.13.2 `bool present | varint id | i8 count | nbt`.
pub fn read_slot(buf: &mut BytesMut, protocol: u32) -> CodecResult<Option<ItemStack>> {
    if protocol >= V1_13_2 {
        if !read_bool(buf)? {
            return Ok(None);
        }
        let item_id = read_varint(buf)?;
        let count = read_i8(buf)?;
        let mut item = ItemStack::new(item_id, count);
        item.nbt = read_nbt(buf)?;
        return Ok(Some(item));
    }

    let item_id = read_i16(buf)?;
    if item_id < 0 {
        return Ok(None);
    }
    let count = read_i8(buf)?;
    let mut item = ItemStack::new(item_id as i32, count);
    if protocol < V1_13 {
        item.damage = read_i16(buf)?;
    }
    item.nbt = read_nbt(buf)?;
    Ok(Some(item))
}

pub fn write_slot(buf: &mut BytesMut, slot: &Option<ItemStack>, protocol: u32) {
    if protocol >= V1_13_2 {
        match slot {
            None => buf.put_u8(0),
            Some(item) => {
                buf.put_u8(1);
                write_varint(buf, item.item_id);
                buf.put_i8(item.count);
                write_nbt(buf, &item.nbt);
            }
        }
        return;
    }

    match slot {
        None => buf.put_i16(-1),
        Some(item) => {
            buf.put_i16(item.item_id as i16);
            buf.put_i8(item.count);
            if protocol < V1_13 {
                buf.put_i16(item.damage);
            }
            write_nbt(buf, &item.nbt);
        }
    }
}
