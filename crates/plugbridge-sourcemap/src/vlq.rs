//! Base64 VLQ codec used by the `mappings` field.

use plugbridge_core::{BridgeError, BridgeResult};

const CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION: u8 = 1 << 5;
const MASK: u8 = CONTINUATION - 1;

/// Appends one signed value in base64-VLQ form.
pub fn encode(value: i64, out: &mut String) {
    let mut v: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (v as u8) & MASK;
        v >>= 5;
        if v != 0 {
            digit |= CONTINUATION;
        }
        out.push(CHARS[digit as usize] as char);
        if v == 0 {
            break;
        }
    }
}

/// Decodes one signed value starting at `pos`, advancing `pos` past it.
pub fn decode(bytes: &[u8], pos: &mut usize) -> BridgeResult<i64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| BridgeError::sourcemap("truncated VLQ segment"))?;
        *pos += 1;
        let digit = decode_char(byte)
            .ok_or_else(|| BridgeError::sourcemap(format!("invalid VLQ character {byte:#x}")))?;
        result |= u64::from(digit & MASK) << shift;
        shift += 5;
        if digit & CONTINUATION == 0 {
            break;
        }
        if shift > 62 {
            return Err(BridgeError::sourcemap("VLQ value overflow"));
        }
    }
    let negative = result & 1 == 1;
    let magnitude = (result >> 1) as i64;
    Ok(if negative { -magnitude } else { magnitude })
}

fn decode_char(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
