//! Minimal OSC 1.0 wire format.
//!
//! Supports messages with `i` (int32), `f` (float32) and `s` (string)
//! arguments, and `#bundle` packets, which are flattened in order. Every
//! field is big-endian and padded to a multiple of four bytes.

use oscnorm_traits::{OscArg, OscMessage};

use crate::error::{Result, TransportError, decode_err};

const BUNDLE_TAG: &[u8] = b"#bundle\0";

/// Nested bundles deeper than this are rejected.
pub const MAX_BUNDLE_DEPTH: usize = 8;

/// Decode a packet into its messages, flattening bundles.
pub fn decode_packet(buf: &[u8]) -> Result<Vec<OscMessage>> {
    let mut out = Vec::new();
    decode_into(buf, 0, &mut out)?;
    Ok(out)
}

/// Decode a packet that must contain exactly one plain message.
pub fn decode_message(buf: &[u8]) -> Result<OscMessage> {
    if buf.starts_with(BUNDLE_TAG) {
        return Err(decode_err("expected a message, got a bundle"));
    }
    let mut r = Reader::new(buf);
    let msg = read_message(&mut r)?;
    if !r.is_empty() {
        return Err(decode_err(format!("{} trailing bytes", r.remaining())));
    }
    Ok(msg)
}

fn decode_into(buf: &[u8], depth: usize, out: &mut Vec<OscMessage>) -> Result<()> {
    if !buf.starts_with(BUNDLE_TAG) {
        out.push(decode_message(buf)?);
        return Ok(());
    }
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(decode_err("bundle nesting too deep"));
    }
    let mut r = Reader::new(&buf[BUNDLE_TAG.len()..]);
    // Time tag: everything is dispatched immediately.
    r.take(8)?;
    while !r.is_empty() {
        let len = r.read_i32()?;
        let len = usize::try_from(len)
            .ok()
            .filter(|l| l % 4 == 0)
            .ok_or_else(|| decode_err(format!("invalid bundle element size {len}")))?;
        let element = r.take(len)?;
        decode_into(element, depth + 1, out)?;
    }
    Ok(())
}

fn read_message(r: &mut Reader<'_>) -> Result<OscMessage> {
    let address = r.read_string()?;
    if !address.starts_with('/') {
        return Err(decode_err(format!("address {address:?} does not start with '/'")));
    }
    // A message without a type tag string carries no arguments.
    if r.is_empty() {
        return Ok(OscMessage::new(address, Vec::new()));
    }
    let tags = r.read_string()?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(decode_err(format!("type tag string {tags:?} lacks ','")));
    };
    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(r.read_i32()?),
            'f' => OscArg::Float(f32::from_bits(r.read_u32()?)),
            's' => OscArg::Str(r.read_string()?),
            other => return Err(decode_err(format!("unsupported type tag {other:?}"))),
        };
        args.push(arg);
    }
    Ok(OscMessage::new(address, args))
}

/// Encode a single message.
pub fn encode_message(msg: &OscMessage) -> Result<Vec<u8>> {
    if !msg.address.starts_with('/') {
        return Err(TransportError::Encode(format!(
            "address {:?} does not start with '/'",
            msg.address
        )));
    }
    let mut out = Vec::with_capacity(64);
    write_string(&mut out, &msg.address)?;
    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    for arg in &msg.args {
        tags.push(match arg {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
        });
    }
    write_string(&mut out, &tags)?;
    for arg in &msg.args {
        match arg {
            OscArg::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            OscArg::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            OscArg::Str(s) => write_string(&mut out, s)?,
        }
    }
    Ok(out)
}

/// Wrap already-encoded elements in a bundle with an "immediately" time tag.
pub fn encode_bundle(elements: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut out = Vec::from(BUNDLE_TAG);
    out.extend_from_slice(&1u64.to_be_bytes());
    for el in elements {
        let len = i32::try_from(el.len())
            .map_err(|_| TransportError::Encode("bundle element too large".into()))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(el);
    }
    Ok(out)
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(TransportError::Encode(format!("{s:?} contains a NUL byte")));
    }
    out.extend_from_slice(s.as_bytes());
    let pad = 4 - (s.len() % 4);
    out.extend(std::iter::repeat_n(0u8, pad));
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(decode_err(format!(
                "need {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// NUL-terminated, zero-padded to four bytes.
    fn read_string(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| decode_err(format!("unterminated string at offset {}", self.pos)))?;
        let padded = (nul / 4 + 1) * 4;
        let bytes = self.take(padded)?;
        let s = std::str::from_utf8(&bytes[..nul])
            .map_err(|e| decode_err(format!("string is not UTF-8: {e}")))?;
        Ok(s.to_string())
    }
}
