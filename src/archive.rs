//! Lump archive ("lib") index.
//!
//! `SLIB` layout, little-endian:
//!
//! ```text
//! 0   magic            b"SLIB"
//! 4   entryCount       u16
//! 6   entries          entryCount * ENTRY_SIZE
//! ```
//!
//! Each entry is `length u32, offset u32, name [u8; 13], flags u8, unpackedLength u32`.
//!
//! The older headerless layout keeps a table of 21-byte records
//! (`length u32, offset u32, name [u8; 13]`) right before an `i16` entry count
//! stored in the last two bytes of the file. See [`ArchiveIndex::openLegacy`].

use {
	crate::error::{Error, Result},
	byteorder::{ReadBytesExt, WriteBytesExt, LE},
	log::debug,
	memchr::memchr,
	std::{
		collections::HashMap,
		io::{self, Read},
	},
};

pub const MAGIC: [u8; 4] = *b"SLIB";
pub const HEADER_SIZE: usize = MAGIC.len() + 2;
pub const NAME_SIZE: usize = 13;
pub const ENTRY_SIZE: usize = 4 + 4 + NAME_SIZE + 1 + 4;
pub const LEGACY_ENTRY_SIZE: usize = 4 + 4 + NAME_SIZE;

pub const FLAG_RLE: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
	pub name: String,
	pub offset: usize,
	pub length: usize,
	pub flags: u8,
	pub unpackedLength: usize,
}

/// One lump's bytes together with the out-of-band compression flag.
#[derive(Clone, Copy, Debug)]
pub struct RawResource<'a> {
	pub bytes: &'a [u8],
	pub compressed: bool,
	pub expectedLength: usize,
}

impl ArchiveEntry {
	pub fn isCompressed(&self) -> bool {
		self.flags & FLAG_RLE != 0
	}

	/// Lump bytes inside the container buffer the index was built from.
	pub fn data<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8]> {
		Error::ensureRange("lump", self.offset, self.length, buffer.len())?;
		Ok(&buffer[self.offset..][..self.length])
	}

	pub fn resource<'a>(&self, buffer: &'a [u8]) -> Result<RawResource<'a>> {
		Ok(RawResource { bytes: self.data(buffer)?, compressed: self.isCompressed(), expectedLength: self.unpackedLength })
	}
}

#[derive(Debug)]
pub struct ArchiveIndex {
	entries: Vec<ArchiveEntry>,
	byName: HashMap<String, usize>,
}

impl ArchiveIndex {
	pub fn open(buffer: &[u8]) -> Result<Self> {
		if buffer.len() < HEADER_SIZE {
			return Err(Error::format("archive header", format!("{} bytes is shorter than the header", buffer.len())));
		}
		let cursor = &mut io::Cursor::new(buffer);
		let mut magic = [0; MAGIC.len()];
		cursor.read_exact(&mut magic)?;
		if magic != MAGIC {
			return Err(Error::format("archive header", format!("bad magic {magic:02X?}, expected {MAGIC:02X?}")));
		}
		let entryCount = cursor.read_u16::<LE>()? as usize;
		Error::ensureRange("archive entry table", HEADER_SIZE, entryCount * ENTRY_SIZE, buffer.len())?;
		let mut entries = Vec::with_capacity(entryCount);
		for _ in 0..entryCount {
			let (length, offset) = (cursor.read_u32::<LE>()? as usize, cursor.read_u32::<LE>()? as usize);
			let name = readName(cursor)?;
			let flags = cursor.read_u8()?;
			let unpackedLength = cursor.read_u32::<LE>()? as usize;
			entries.push(ArchiveEntry { name, offset, length, flags, unpackedLength });
		}
		Self::fromEntries(entries, buffer.len())
	}

	/// Opens the headerless layout, where every lump is stored uncompressed.
	pub fn openLegacy(buffer: &[u8]) -> Result<Self> {
		if buffer.len() < 2 {
			return Err(Error::format("legacy archive trailer", "missing entry count"));
		}
		let entryCount = (&buffer[buffer.len() - 2..]).read_i16::<LE>()?;
		let entryCount = usize::try_from(entryCount)
			.map_err(|_| Error::format("legacy archive trailer", format!("negative entry count {entryCount}")))?;
		let tableSize = entryCount * LEGACY_ENTRY_SIZE;
		let tableStart = (buffer.len() - 2).checked_sub(tableSize).ok_or(Error::TruncatedData {
			context: "legacy archive entry table",
			offset: 0,
			need: tableSize,
			have: buffer.len() - 2,
		})?;
		let cursor = &mut io::Cursor::new(&buffer[tableStart..]);
		let mut entries = Vec::with_capacity(entryCount);
		for _ in 0..entryCount {
			let (length, offset) = (cursor.read_u32::<LE>()? as usize, cursor.read_u32::<LE>()? as usize);
			let name = readName(cursor)?;
			entries.push(ArchiveEntry { name, offset, length, flags: 0, unpackedLength: length });
		}
		Self::fromEntries(entries, buffer.len())
	}

	fn fromEntries(entries: Vec<ArchiveEntry>, bufferLength: usize) -> Result<Self> {
		let mut byName = HashMap::with_capacity(entries.len());
		for (i, entry) in entries.iter().enumerate() {
			Error::ensureRange("archive entry", entry.offset, entry.length, bufferLength)?;
			if byName.insert(entry.name.to_ascii_lowercase(), i).is_some() {
				return Err(Error::format("archive entry table", format!("duplicate lump name {:?}", entry.name)));
			}
		}
		debug!("indexed {} lumps", entries.len());
		Ok(ArchiveIndex { entries, byName })
	}

	/// Case-insensitive, as DOS names are.
	pub fn lookup(&self, name: &str) -> Result<&ArchiveEntry> {
		self.byName
			.get(&name.to_ascii_lowercase())
			.map(|&i| &self.entries[i])
			.ok_or_else(|| Error::NotFound { name: name.to_owned() })
	}

	pub fn entries(&self) -> &[ArchiveEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

fn readName(cursor: &mut io::Cursor<&[u8]>) -> Result<String> {
	let mut raw = [0_u8; NAME_SIZE];
	cursor.read_exact(&mut raw)?;
	let name = &raw[..memchr(0, &raw).unwrap_or(NAME_SIZE)];
	if name.is_empty() || !name.iter().all(|byte| byte.is_ascii_graphic()) {
		return Err(Error::format("archive entry name", format!("{raw:02X?} is not a DOS file name")));
	}
	// checked above: printable ASCII
	Ok(name.iter().map(|&byte| byte as char).collect())
}

/// Writes `SLIB` containers. Lumps are laid out after the entry table in insertion order.
#[derive(Default)]
pub struct Builder {
	lumps: Vec<(String, Vec<u8>, u8, usize)>,
}

impl Builder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, name: &str, bytes: Vec<u8>) -> &mut Self {
		let unpackedLength = bytes.len();
		self.lumps.push((name.to_owned(), bytes, 0, unpackedLength));
		self
	}

	/// Stores `bytes` RLE-encoded, flagged as such.
	pub fn addCompressed(&mut self, name: &str, bytes: &[u8]) -> &mut Self {
		self.lumps.push((name.to_owned(), crate::rle::encode(bytes), FLAG_RLE, bytes.len()));
		self
	}

	/// Stores pre-encoded bytes with an arbitrary flag and declared length, as found in the wild.
	pub fn addRaw(&mut self, name: &str, bytes: Vec<u8>, flags: u8, unpackedLength: usize) -> &mut Self {
		self.lumps.push((name.to_owned(), bytes, flags, unpackedLength));
		self
	}

	pub fn build(&self) -> Result<Vec<u8>> {
		let entryCount = u16::try_from(self.lumps.len())
			.map_err(|_| Error::format("archive builder", format!("{} lumps do not fit a u16 count", self.lumps.len())))?;
		let tableEnd = HEADER_SIZE + self.lumps.len() * ENTRY_SIZE;
		let dataLength: usize = self.lumps.iter().map(|(_, bytes, ..)| bytes.len()).sum();
		let mut out = Vec::with_capacity(tableEnd + dataLength);
		out.extend_from_slice(&MAGIC);
		out.write_u16::<LE>(entryCount)?;
		let mut offset = tableEnd;
		for (name, bytes, flags, unpackedLength) in &self.lumps {
			if name.is_empty() || name.len() >= NAME_SIZE || !name.bytes().all(|byte| byte.is_ascii_graphic()) {
				return Err(Error::format("archive builder", format!("{name:?} is not a DOS file name")));
			}
			let toU32 = |value: usize| {
				u32::try_from(value).map_err(|_| Error::format("archive builder", format!("{value} overflows u32")))
			};
			out.write_u32::<LE>(toU32(bytes.len())?)?;
			out.write_u32::<LE>(toU32(offset)?)?;
			let mut rawName = [0_u8; NAME_SIZE];
			rawName[..name.len()].copy_from_slice(name.as_bytes());
			out.extend_from_slice(&rawName);
			out.write_u8(*flags)?;
			out.write_u32::<LE>(toU32(*unpackedLength)?)?;
			offset += bytes.len();
		}
		for (_, bytes, ..) in &self.lumps {
			out.extend_from_slice(bytes);
		}
		Ok(out)
	}
}
