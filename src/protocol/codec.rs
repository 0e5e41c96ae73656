//! Kafka primitive types: big-endian fixed-width integers, varints, compact
//! strings/arrays/bytes, UUIDs and the tagged-field placeholder.
//!
//! Every reader checks the remaining length before touching the buffer, so a
//! short input surfaces as [`DecodeError::Truncated`] instead of a panic.

use crate::error::{DecodeError, DecodeResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// Width of a UUID on the wire.
pub const UUID_LEN: usize = 16;

const MAX_VARINT_BYTES: usize = 10;

/// Upper bound on elements reserved up front for a decoded count. Larger
/// collections grow as elements actually decode.
pub const MAX_PREALLOC_ELEMENTS: usize = 1024;

/// Types that serialize themselves onto the wire.
pub trait Encode {
    fn encode(&self, dst: &mut BytesMut);

    fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }
}

/// Types that parse themselves off the wire.
pub trait Decode: Sized {
    fn decode(src: &mut Bytes) -> DecodeResult<Self>;
}

fn ensure<B: Buf>(src: &B, needed: usize) -> DecodeResult<()> {
    if src.remaining() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: src.remaining(),
        });
    }
    Ok(())
}

macro_rules! checked_get {
    ($(#[$doc:meta])* $name:ident, $get:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name<B: Buf>(src: &mut B) -> DecodeResult<$ty> {
            ensure(src, std::mem::size_of::<$ty>())?;
            Ok(src.$get())
        }
    };
}

checked_get!(read_i8, get_i8, i8);
checked_get!(read_u8, get_u8, u8);
checked_get!(read_i16, get_i16, i16);
checked_get!(read_u16, get_u16, u16);
checked_get!(read_i32, get_i32, i32);
checked_get!(read_u32, get_u32, u32);
checked_get!(read_i64, get_i64, i64);
checked_get!(read_u64, get_u64, u64);

pub fn read_bool<B: Buf>(src: &mut B) -> DecodeResult<bool> {
    Ok(read_u8(src)? != 0)
}

/// Unsigned LEB128, 1..=10 bytes.
pub fn read_uvarint<B: Buf>(src: &mut B) -> DecodeResult<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_BYTES {
        ensure(src, 1)?;
        let byte = src.get_u8();
        if i == MAX_VARINT_BYTES - 1 && byte > 1 {
            return Err(DecodeError::VarintTooLong);
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(DecodeError::VarintTooLong)
}

/// Zigzag-encoded signed varint.
pub fn read_varint<B: Buf>(src: &mut B) -> DecodeResult<i64> {
    let raw = read_uvarint(src)?;
    Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
}

pub fn put_uvarint<B: BufMut>(dst: &mut B, mut value: u64) {
    while value > 0x7f {
        dst.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

pub fn put_varint<B: BufMut>(dst: &mut B, value: i64) {
    put_uvarint(dst, ((value << 1) ^ (value >> 63)) as u64);
}

/// Decode a "length + 1" prefix: `0` is null, otherwise the true length.
fn read_compact_len<B: Buf>(src: &mut B) -> DecodeResult<Option<usize>> {
    match read_uvarint(src)? {
        0 => Ok(None),
        n => usize::try_from(n - 1)
            .map(Some)
            .map_err(|_| DecodeError::InvalidLength(n as i64)),
    }
}

fn put_compact_len<B: BufMut>(dst: &mut B, len: usize) {
    put_uvarint(dst, len as u64 + 1);
}

pub fn read_bytes<B: Buf>(src: &mut B, len: usize) -> DecodeResult<Bytes> {
    ensure(src, len)?;
    Ok(src.copy_to_bytes(len))
}

/// Fixed-length UTF-8 string.
pub fn read_string<B: Buf>(src: &mut B, len: usize) -> DecodeResult<String> {
    let raw = read_bytes(src, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
}

/// `uvarint(len + 1)` then bytes. A zero prefix decodes as `None`, distinct
/// from the empty string.
pub fn read_compact_string<B: Buf>(src: &mut B) -> DecodeResult<Option<String>> {
    match read_compact_len(src)? {
        None => Ok(None),
        Some(len) => read_string(src, len).map(Some),
    }
}

pub fn put_compact_string<B: BufMut>(dst: &mut B, value: &str) {
    put_compact_len(dst, value.len());
    dst.put_slice(value.as_bytes());
}

pub fn put_compact_nullable_string<B: BufMut>(dst: &mut B, value: Option<&str>) {
    match value {
        Some(s) => put_compact_string(dst, s),
        None => put_uvarint(dst, 0),
    }
}

/// Classic nullable string: int16 length, `-1` for null.
pub fn read_nullable_string<B: Buf>(src: &mut B) -> DecodeResult<Option<String>> {
    let len = read_i16(src)?;
    if len < 0 {
        return Ok(None);
    }
    read_string(src, len as usize).map(Some)
}

/// Strings longer than `i16::MAX` bytes are cut at the last char boundary
/// that fits.
pub fn put_nullable_string<B: BufMut>(dst: &mut B, value: Option<&str>) {
    match value {
        Some(s) => {
            let mut len = s.len().min(i16::MAX as usize);
            while !s.is_char_boundary(len) {
                len -= 1;
            }
            dst.put_i16(len as i16);
            dst.put_slice(&s.as_bytes()[..len]);
        }
        None => dst.put_i16(-1),
    }
}

pub fn read_compact_bytes<B: Buf>(src: &mut B) -> DecodeResult<Option<Bytes>> {
    match read_compact_len(src)? {
        None => Ok(None),
        Some(len) => read_bytes(src, len).map(Some),
    }
}

pub fn put_compact_bytes<B: BufMut>(dst: &mut B, value: &[u8]) {
    put_compact_len(dst, value.len());
    dst.put_slice(value);
}

/// `uvarint(count + 1)` then `count` elements; a zero prefix is a null array.
pub fn read_compact_array<B, T, F>(src: &mut B, mut read: F) -> DecodeResult<Option<Vec<T>>>
where
    B: Buf,
    F: FnMut(&mut B) -> DecodeResult<T>,
{
    let Some(count) = read_compact_len(src)? else {
        return Ok(None);
    };
    let mut items = Vec::with_capacity(count.min(src.remaining()).min(MAX_PREALLOC_ELEMENTS));
    for _ in 0..count {
        items.push(read(src)?);
    }
    Ok(Some(items))
}

pub fn put_compact_array<B, T, F>(dst: &mut B, items: &[T], mut write: F)
where
    B: BufMut,
    F: FnMut(&mut B, &T),
{
    put_compact_len(dst, items.len());
    for item in items {
        write(dst, item);
    }
}

pub fn put_compact_nullable_array<B, T, F>(dst: &mut B, items: Option<&[T]>, write: F)
where
    B: BufMut,
    F: FnMut(&mut B, &T),
{
    match items {
        Some(items) => put_compact_array(dst, items, write),
        None => put_uvarint(dst, 0),
    }
}

pub fn read_uuid<B: Buf>(src: &mut B) -> DecodeResult<Uuid> {
    ensure(src, UUID_LEN)?;
    let mut raw = [0u8; UUID_LEN];
    src.copy_to_slice(&mut raw);
    Ok(Uuid::from_bytes(raw))
}

pub fn put_uuid<B: BufMut>(dst: &mut B, id: &Uuid) {
    dst.put_slice(id.as_bytes());
}

/// Consume the tagged-field section.
///
/// Only the count is read; the tag/value pairs it announces are not. Peers
/// that send real tagged fields will desync the stream. Returns the count.
pub fn skip_tagged_fields<B: Buf>(src: &mut B) -> DecodeResult<u64> {
    read_uvarint(src)
}

/// Write an empty tagged-field section (a single zero byte).
pub fn put_empty_tagged_fields<B: BufMut>(dst: &mut B) {
    dst.put_u8(0);
}
