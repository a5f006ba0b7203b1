// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte adapters applied on the way in and out of a bus.
//!
//! Terminals and modems disagree about line endings; these adapters let a
//! bus normalize traffic without the observers knowing.

/// Translates one byte payload into another.
pub type ByteAdapter = Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Decode adapter dropping carriage returns from inbound chunks.
pub fn strip_cr() -> ByteAdapter {
    Box::new(|chunk| chunk.iter().copied().filter(|b| *b != b'\r').collect())
}

/// Encode adapter expanding `\n` to `\r\n` for CRLF endpoints.
pub fn lf_to_crlf() -> ByteAdapter {
    Box::new(|payload| {
        let mut out = Vec::with_capacity(payload.len() + 8);
        for b in payload {
            if *b == b'\n' {
                out.push(b'\r');
            }
            out.push(*b);
        }
        out
    })
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
