use {std::io, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
	#[error("format error in {context}: {message}")]
	Format { context: &'static str, message: String },

	#[error("truncated data in {context}: need {need} bytes at offset {offset:#x}, have {have}")]
	TruncatedData { context: &'static str, offset: usize, need: usize, have: usize },

	#[error("resource {name:?} not found")]
	NotFound { name: String },

	#[error("RLE stream decodes to {produced} bytes, expected {expected}: {reason}")]
	Decode { expected: usize, produced: usize, reason: &'static str },

	#[error("object record #{index} has unknown type code {code}")]
	UnknownObjectType { index: usize, code: u8 },

	#[error("no palette supplied")]
	MissingPalette,

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Toml(#[from] toml::de::Error),

	#[error(transparent)]
	PngDecode(#[from] png::DecodingError),

	#[error(transparent)]
	PngEncode(#[from] png::EncodingError),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
	pub(crate) fn format(context: &'static str, message: impl Into<String>) -> Self {
		Error::Format { context, message: message.into() }
	}

	/// Checks that `need` bytes starting at `offset` fit in a buffer of `have` bytes.
	pub(crate) fn ensureRange(context: &'static str, offset: usize, need: usize, have: usize) -> Result<()> {
		match offset.checked_add(need) {
			Some(end) if end <= have => Ok(()),
			_ => Err(Error::TruncatedData { context, offset, need, have: have.saturating_sub(offset) }),
		}
	}
}
