//! LZF decompression for tile payloads.
//!
//! Krita compresses each tile with a byte-oriented LZ77 variant. The stream
//! is a sequence of control bytes: values below 32 introduce a literal run,
//! higher values encode a back-reference into the already-produced output
//! (3-bit length, 13-bit offset, with an extension byte for long matches).
//!
//! The input is untrusted. The three bounds checks here (literal overrun,
//! back-reference overrun, reference before the start of the output) are the
//! sole protection against out-of-bounds access and must not be relaxed.

use crate::util::{Error, Result};

/// Decompress an LZF stream into `output`, returning the byte count produced.
///
/// `output` is expected to be zero-initialized at the full decompressed tile
/// size; a stream that produces fewer bytes leaves the tail untouched.
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut ip = 0usize; // input cursor
    let mut op = 0usize; // output cursor

    while ip < input.len() {
        let c = input[ip] as usize;
        ip += 1;

        if c < 32 {
            // literal run of c + 1 bytes
            let run = c + 1;
            if op + run > output.len() {
                return Err(Error::LzfLiteralOverrun {
                    run,
                    cursor: op,
                    capacity: output.len(),
                });
            }
            if ip + run > input.len() {
                return Err(Error::TruncatedBlob {
                    offset: ip,
                    needed: ip + run - input.len(),
                });
            }
            output[op..op + run].copy_from_slice(&input[ip..ip + run]);
            op += run;
            ip += run;
        } else {
            // back-reference: copies len + 3 bytes from earlier output
            let mut len = (c >> 5) - 1;
            let mut distance = (c & 31) << 8;

            if len == 6 {
                len += take(input, &mut ip)? as usize;
            }
            distance += take(input, &mut ip)? as usize;
            distance += 1;

            if op + len + 3 > output.len() {
                return Err(Error::LzfReferenceOverrun {
                    len: len + 3,
                    cursor: op,
                    capacity: output.len(),
                });
            }
            let Some(mut rp) = op.checked_sub(distance) else {
                return Err(Error::LzfReferenceUnderflow {
                    distance,
                    cursor: op,
                });
            };

            // Byte-by-byte: the reference may overlap the bytes being written.
            for _ in 0..len + 3 {
                output[op] = output[rp];
                op += 1;
                rp += 1;
            }
        }
    }

    Ok(op)
}

#[inline]
fn take(input: &[u8], ip: &mut usize) -> Result<u8> {
    let byte = *input.get(*ip).ok_or(Error::TruncatedBlob {
        offset: *ip,
        needed: 1,
    })?;
    *ip += 1;
    Ok(byte)
}
