//! Run-length codec used by compressed lumps.
//!
//! A stream is a sequence of tokens, each starting with a control byte `c`:
//!
//! - `c < 0x80`: literal run, the next `c` bytes are copied as-is;
//! - `c >= 0x80`: repeat run, the next byte is emitted `c - 0x80` times.
//!
//! There is no terminator token; the expected output length comes from the
//! archive entry.

use {
	crate::{
		archive::RawResource,
		error::{Error, Result},
	},
	core::iter,
};

pub const REPEAT_FLAG: u8 = 0x80;
pub const MAX_RUN: usize = (REPEAT_FLAG - 1) as _;

/// Shortest run the reference encoder turns into a repeat token.
const MIN_REPEAT: usize = 3;

pub fn decode(stream: &[u8], expectedLength: usize) -> Result<Vec<u8>> {
	// a two-byte repeat token yields at most MAX_RUN bytes
	let capacity = expectedLength.min(stream.len().saturating_mul(MAX_RUN));
	let (mut output, mut i) = (Vec::with_capacity(capacity), 0);
	let fail = |produced, reason| Err(Error::Decode { expected: expectedLength, produced, reason });
	while output.len() < expectedLength {
		let Some(&control) = stream.get(i) else {
			return fail(output.len(), "token stream exhausted");
		};
		i += 1;
		if control < REPEAT_FLAG {
			let runLength = control as usize;
			if output.len() + runLength > expectedLength {
				return fail(output.len() + runLength, "literal run overshoots");
			}
			let Some(literal) = stream.get(i..i + runLength) else {
				output.extend_from_slice(&stream[i..]);
				return fail(output.len(), "literal run cut short");
			};
			output.extend_from_slice(literal);
			i += runLength;
		} else {
			let runLength = (control - REPEAT_FLAG) as usize;
			if output.len() + runLength > expectedLength {
				return fail(output.len() + runLength, "repeat run overshoots");
			}
			let Some(&value) = stream.get(i) else {
				return fail(output.len(), "repeat run missing its value");
			};
			output.extend(iter::repeat(value).take(runLength));
			i += 1;
		}
	}
	if i != stream.len() {
		return fail(output.len(), "trailing tokens after expected length");
	}
	Ok(output)
}

/// Decodes a lump body, honouring its out-of-band compression flag.
pub fn decodeResource(raw: &RawResource<'_>) -> Result<Vec<u8>> {
	if raw.compressed {
		return decode(raw.bytes, raw.expectedLength);
	}
	if raw.bytes.len() != raw.expectedLength {
		return Err(Error::Decode {
			expected: raw.expectedLength,
			produced: raw.bytes.len(),
			reason: "uncompressed lump length differs from declared length",
		});
	}
	Ok(raw.bytes.to_vec())
}

/// Reference encoder. `decode(&encode(x), x.len())` gives back `x`.
pub fn encode(input: &[u8]) -> Vec<u8> {
	let (mut output, mut literalStart, mut i) = (Vec::with_capacity(input.len() + input.len() / MAX_RUN + 1), 0, 0);

	fn flushLiteral(output: &mut Vec<u8>, literal: &[u8]) {
		for chunk in literal.chunks(MAX_RUN) {
			output.push(chunk.len() as _);
			output.extend_from_slice(chunk);
		}
	}

	while i < input.len() {
		let value = input[i];
		let runLength = input[i..].iter().take(MAX_RUN).take_while(|&&byte| byte == value).count();
		if runLength >= MIN_REPEAT {
			flushLiteral(&mut output, &input[literalStart..i]);
			output.extend([REPEAT_FLAG + runLength as u8, value]);
			i += runLength;
			literalStart = i;
		} else {
			i += runLength;
		}
	}
	flushLiteral(&mut output, &input[literalStart..]);
	output
}
