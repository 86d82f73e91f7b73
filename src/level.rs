//! Level lump decoding.
//!
//! Decompressed body, little-endian:
//!
//! ```text
//! 0   width               u16
//! 2   height              u16
//! 4   floorOffset         u32   0 = no such layer
//! 8   wallOffset          u32
//! 12  ceilingOffset       u32
//! 16  objectTableOffset   u32
//! 20  objectCount         u16
//! ```
//!
//! A layer is `width * height` `u16` tile values, row-major. An object record is
//! `code u8, layer u8, x u16, y u16, sprite u16, subX u8, subY u8, param u16`.

use {
	crate::{
		archive::RawResource,
		error::{Error, Result},
		rle,
	},
	byteorder::{ReadBytesExt, WriteBytesExt, LE},
	core::fmt,
	log::debug,
	serde::{Deserialize, Serialize},
	std::io,
};

pub const HEADER_SIZE: usize = 22;
pub const OBJECT_RECORD_SIZE: usize = 12;
pub const TILE_SIZE: usize = 2;

/// Tile value meaning "nothing here" in every layer.
pub const EMPTY_TILE: u16 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
	Floor,
	Wall,
	Ceiling,
}

impl LayerKind {
	/// Back-to-front drawing order within one cell.
	pub const ALL: [LayerKind; 3] = [LayerKind::Floor, LayerKind::Wall, LayerKind::Ceiling];

	pub fn fromCode(code: u8) -> Option<Self> {
		Self::ALL.get(code as usize).copied()
	}

	pub fn code(self) -> u8 {
		self as _
	}
}

impl fmt::Display for LayerKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LayerKind::Floor => "floor",
			LayerKind::Wall => "wall",
			LayerKind::Ceiling => "ceiling",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayer {
	pub kind: LayerKind,
	pub width: usize,
	pub height: usize,
	pub tiles: Vec<u16>,
}

impl MapLayer {
	pub fn new(kind: LayerKind, width: usize, height: usize, tiles: Vec<u16>) -> Result<Self> {
		if tiles.len() != width * height {
			return Err(Error::format(
				"map layer",
				format!("{} tiles do not fill a {width}x{height} {kind} grid", tiles.len()),
			));
		}
		Ok(MapLayer { kind, width, height, tiles })
	}

	pub fn get(&self, x: usize, y: usize) -> Option<u16> {
		(x < self.width && y < self.height).then(|| self.tiles[y * self.width + x])
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
	Monster = 1,
	Item = 2,
	Decoration = 3,
	Door = 4,
	Teleporter = 5,
	Transition = 6,
}

impl ObjectKind {
	pub fn fromCode(code: u8) -> Option<Self> {
		Some(match code {
			1 => ObjectKind::Monster,
			2 => ObjectKind::Item,
			3 => ObjectKind::Decoration,
			4 => ObjectKind::Door,
			5 => ObjectKind::Teleporter,
			6 => ObjectKind::Transition,
			_ => return None,
		})
	}

	pub fn code(self) -> u8 {
		self as _
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
	West,
	North,
}

/// Kind-specific part of an object record, decoded from its `param` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectAttributes {
	Monster { creature: u16 },
	Item { itemType: u16 },
	Decoration { variant: u16 },
	Door { facing: Facing },
	Teleporter { targetX: u8, targetY: u8 },
	Transition { targetLevel: u16 },
}

impl ObjectAttributes {
	fn decode(kind: ObjectKind, param: u16) -> Self {
		match kind {
			ObjectKind::Monster => ObjectAttributes::Monster { creature: param },
			ObjectKind::Item => ObjectAttributes::Item { itemType: param },
			ObjectKind::Decoration => ObjectAttributes::Decoration { variant: param },
			ObjectKind::Door => ObjectAttributes::Door { facing: if param == 0 { Facing::West } else { Facing::North } },
			ObjectKind::Teleporter => {
				let [targetX, targetY] = param.to_le_bytes();
				ObjectAttributes::Teleporter { targetX, targetY }
			}
			ObjectKind::Transition => ObjectAttributes::Transition { targetLevel: param },
		}
	}

	fn param(self) -> u16 {
		match self {
			ObjectAttributes::Monster { creature: value }
			| ObjectAttributes::Item { itemType: value }
			| ObjectAttributes::Decoration { variant: value }
			| ObjectAttributes::Transition { targetLevel: value } => value,
			ObjectAttributes::Door { facing } => facing as _,
			ObjectAttributes::Teleporter { targetX, targetY } => u16::from_le_bytes([targetX, targetY]),
		}
	}

	pub fn kind(self) -> ObjectKind {
		match self {
			ObjectAttributes::Monster { .. } => ObjectKind::Monster,
			ObjectAttributes::Item { .. } => ObjectKind::Item,
			ObjectAttributes::Decoration { .. } => ObjectKind::Decoration,
			ObjectAttributes::Door { .. } => ObjectKind::Door,
			ObjectAttributes::Teleporter { .. } => ObjectKind::Teleporter,
			ObjectAttributes::Transition { .. } => ObjectKind::Transition,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedObject {
	pub kind: ObjectKind,
	pub x: usize,
	pub y: usize,
	pub layer: LayerKind,
	pub sprite: u16,

	/// Position inside the cell, 0..=63 on each axis; 32 is the centre.
	pub subX: u8,
	pub subY: u8,

	pub attributes: ObjectAttributes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
	pub name: String,
	pub width: usize,
	pub height: usize,

	#[serde(default, rename = "layer", skip_serializing_if = "Vec::is_empty")]
	pub layers: Vec<MapLayer>,

	#[serde(default, rename = "object", skip_serializing_if = "Vec::is_empty")]
	pub objects: Vec<PlacedObject>,
}

impl LevelData {
	pub fn layer(&self, kind: LayerKind) -> Option<&MapLayer> {
		self.layers.iter().find(|layer| layer.kind == kind)
	}
}

/// `"RUINSA.MAP"` becomes `"ruinsa"`.
pub fn levelName(entryName: &str) -> String {
	let stem = entryName.rsplit_once('.').map_or(entryName, |(stem, _)| stem);
	stem.to_ascii_lowercase()
}

pub fn decode(entryName: &str, raw: &RawResource<'_>) -> Result<LevelData> {
	decodeBody(entryName, &rle::decodeResource(raw)?)
}

pub fn decodeBody(entryName: &str, body: &[u8]) -> Result<LevelData> {
	Error::ensureRange("level header", 0, HEADER_SIZE, body.len())?;
	let cursor = &mut io::Cursor::new(body);
	let (width, height) = (cursor.read_u16::<LE>()? as usize, cursor.read_u16::<LE>()? as usize);
	if width == 0 || height == 0 {
		return Err(Error::format("level header", format!("empty {width}x{height} grid")));
	}
	let mut layerOffsets = [0; LayerKind::ALL.len()];
	for offset in &mut layerOffsets {
		*offset = cursor.read_u32::<LE>()? as usize;
	}
	let objectTableOffset = cursor.read_u32::<LE>()? as usize;
	let objectCount = cursor.read_u16::<LE>()? as usize;

	let checkOffset = |what: &str, offset: usize| {
		if offset < HEADER_SIZE {
			return Err(Error::format("level header", format!("{what} offset {offset:#x} points into the header")));
		}
		Ok(())
	};

	let mut layers = Vec::with_capacity(LayerKind::ALL.len());
	for (kind, offset) in LayerKind::ALL.into_iter().zip(layerOffsets) {
		if offset == 0 {
			continue;
		}
		checkOffset("layer", offset)?;
		Error::ensureRange("map layer", offset, width * height * TILE_SIZE, body.len())?;
		cursor.set_position(offset as _);
		let mut tiles = Vec::with_capacity(width * height);
		for _ in 0..width * height {
			tiles.push(cursor.read_u16::<LE>()?);
		}
		layers.push(MapLayer::new(kind, width, height, tiles)?);
	}

	let mut objects = Vec::with_capacity(objectCount);
	if objectCount > 0 {
		checkOffset("object table", objectTableOffset)?;
		Error::ensureRange("object table", objectTableOffset, objectCount * OBJECT_RECORD_SIZE, body.len())?;
		cursor.set_position(objectTableOffset as _);
		for index in 0..objectCount {
			let code = cursor.read_u8()?;
			let kind = ObjectKind::fromCode(code).ok_or(Error::UnknownObjectType { index, code })?;
			let layerCode = cursor.read_u8()?;
			let layer = LayerKind::fromCode(layerCode)
				.ok_or_else(|| Error::format("object record", format!("#{index} has layer code {layerCode}")))?;
			let (x, y) = (cursor.read_u16::<LE>()? as usize, cursor.read_u16::<LE>()? as usize);
			if x >= width || y >= height {
				return Err(Error::format(
					"object record",
					format!("#{index} at ({x}, {y}) is outside the {width}x{height} grid"),
				));
			}
			let sprite = cursor.read_u16::<LE>()?;
			let (subX, subY) = (cursor.read_u8()?, cursor.read_u8()?);
			let attributes = ObjectAttributes::decode(kind, cursor.read_u16::<LE>()?);
			objects.push(PlacedObject { kind, x, y, layer, sprite, subX, subY, attributes });
		}
	}

	let name = levelName(entryName);
	debug!("decoded level {name:?}: {width}x{height}, {} layers, {} objects", layers.len(), objects.len());
	Ok(LevelData { name, width, height, layers, objects })
}

/// Writes `level` back into the uncompressed body layout.
pub fn encode(level: &LevelData) -> Result<Vec<u8>> {
	let dimension = |value: usize| {
		u16::try_from(value).map_err(|_| Error::format("level encoder", format!("dimension {value} overflows u16")))
	};
	let (width, height) = (dimension(level.width)?, dimension(level.height)?);
	let objectCount = u16::try_from(level.objects.len())
		.map_err(|_| Error::format("level encoder", format!("{} objects overflow u16", level.objects.len())))?;
	let layerSize = level.width * level.height * TILE_SIZE;

	let mut out = Vec::new();
	out.write_u16::<LE>(width)?;
	out.write_u16::<LE>(height)?;
	let mut nextOffset = HEADER_SIZE;
	for kind in LayerKind::ALL {
		match level.layer(kind) {
			Some(_) => {
				out.write_u32::<LE>(nextOffset as _)?;
				nextOffset += layerSize;
			}
			None => out.write_u32::<LE>(0)?,
		}
	}
	out.write_u32::<LE>(nextOffset as _)?;
	out.write_u16::<LE>(objectCount)?;
	for kind in LayerKind::ALL {
		if let Some(layer) = level.layer(kind) {
			if layer.tiles.len() != level.width * level.height {
				return Err(Error::format("level encoder", format!("{kind} layer does not match the level size")));
			}
			for &tile in &layer.tiles {
				out.write_u16::<LE>(tile)?;
			}
		}
	}
	for (index, object) in level.objects.iter().enumerate() {
		if object.kind != object.attributes.kind() {
			return Err(Error::format(
				"level encoder",
				format!("object #{index} is a {:?} with {:?} attributes", object.kind, object.attributes.kind()),
			));
		}
		out.write_u8(object.kind.code())?;
		out.write_u8(object.layer.code())?;
		out.write_u16::<LE>(dimension(object.x)?)?;
		out.write_u16::<LE>(dimension(object.y)?)?;
		out.write_u16::<LE>(object.sprite)?;
		out.write_u8(object.subX)?;
		out.write_u8(object.subY)?;
		out.write_u16::<LE>(object.attributes.param())?;
	}
	Ok(out)
}
