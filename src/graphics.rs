use {
	crate::{
		error::{Error, Result},
		level::{LayerKind, ObjectKind, PlacedObject},
	},
	log::debug,
	png::{BitDepth, ColorType},
	serde::Deserialize,
	std::{
		collections::HashMap,
		fs::{self, File},
		io::{BufReader, Read},
		path::Path,
	},
};

/// Palette index treated as fully transparent in every bitmap.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Indexed-colour bitmap for one tile or object sprite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGraphic {
	pub width: usize,
	pub height: usize,
	pub pixels: Vec<u8>,
}

impl TileGraphic {
	pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
		if pixels.len() != width * height {
			return Err(Error::format("tile graphic", format!("{} pixels for a {width}x{height} bitmap", pixels.len())));
		}
		Ok(TileGraphic { width, height, pixels })
	}

	pub fn solid(width: usize, height: usize, index: u8) -> Self {
		TileGraphic { width, height, pixels: vec![index; width * height] }
	}

	/*
		Floor rhombus :

		1st line : 4 pixels wide on a 64x32 tile
		2nd line : 8 pixels
		...
		middle lines : the full width, then shrinking back by the same steps
	*/
	pub fn diamond(width: usize, height: usize, index: u8) -> Self {
		let mut pixels = vec![TRANSPARENT_INDEX; width * height];
		for y in 0..height {
			let fromEdge = if y < height / 2 { y } else { height - 1 - y };
			let nbpix = ((2 * fromEdge + 2) * width / height).min(width);
			let xjump = (width - nbpix) / 2;
			pixels[y * width + xjump..][..nbpix].fill(index);
		}
		TileGraphic { width, height, pixels }
	}

	/// Reads an 8-bit indexed PNG; its own palette is ignored in favour of the level palette.
	pub fn fromPNG(reader: impl Read) -> Result<Self> {
		let mut png = png::Decoder::new(reader).read_info()?;
		let (colorType, bitDepth) = png.output_color_type();
		if colorType != ColorType::Indexed || bitDepth != BitDepth::Eight {
			return Err(Error::format("tile PNG", format!("{colorType:?}/{bitDepth:?} is not 8-bit indexed")));
		}
		let mut pixels = vec![0; png.output_buffer_size()];
		let frame = png.next_frame(&mut pixels)?;
		let (width, height) = (frame.width as usize, frame.height as usize);
		pixels.truncate(frame.buffer_size());
		if frame.line_size != width {
			return Err(Error::format("tile PNG", format!("line size {} for width {width}", frame.line_size)));
		}
		TileGraphic::new(width, height, pixels)
	}
}

/// Resolves tile values and placed objects to bitmaps. Supplied by the caller; never mutated while rendering.
pub trait TileGraphicsLookup {
	fn tile(&self, kind: LayerKind, index: u16) -> Option<&TileGraphic>;
	fn object(&self, object: &PlacedObject) -> Option<&TileGraphic>;
}

/// Map-backed lookup. Objects are keyed by kind and sprite number.
#[derive(Clone, Debug, Default)]
pub struct TileSet {
	tiles: HashMap<(LayerKind, u16), TileGraphic>,
	objects: HashMap<(ObjectKind, u16), TileGraphic>,
}

impl TileSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insertTile(&mut self, kind: LayerKind, index: u16, graphic: TileGraphic) -> &mut Self {
		self.tiles.insert((kind, index), graphic);
		self
	}

	pub fn insertObject(&mut self, kind: ObjectKind, sprite: u16, graphic: TileGraphic) -> &mut Self {
		self.objects.insert((kind, sprite), graphic);
		self
	}

	pub fn len(&self) -> usize {
		self.tiles.len() + self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Loads every PNG listed by a TOML manifest; paths are relative to the manifest.
	///
	/// ```toml
	/// [[tile]]
	/// layer = "floor"
	/// index = 1
	/// png = "floors/001.png"
	///
	/// [[object]]
	/// kind = "Monster"
	/// sprite = 3
	/// png = "sprites/bat.png"
	/// ```
	pub fn loadManifest(path: &Path) -> Result<Self> {
		#[derive(Deserialize)]
		struct Manifest {
			#[serde(default, rename = "tile")]
			tiles: Vec<TileRecord>,

			#[serde(default, rename = "object")]
			objects: Vec<ObjectRecord>,
		}
		#[derive(Deserialize)]
		struct TileRecord {
			layer: LayerKind,
			index: u16,
			png: String,
		}
		#[derive(Deserialize)]
		struct ObjectRecord {
			kind: ObjectKind,
			sprite: u16,
			png: String,
		}

		let manifest: Manifest = toml::from_str(&fs::read_to_string(path)?)?;
		let baseDir = path.parent().unwrap_or_else(|| Path::new("."));
		let load = |png: &str| TileGraphic::fromPNG(BufReader::new(File::open(baseDir.join(png))?));
		let mut set = TileSet::new();
		for TileRecord { layer, index, png } in &manifest.tiles {
			set.insertTile(*layer, *index, load(png)?);
		}
		for ObjectRecord { kind, sprite, png } in &manifest.objects {
			set.insertObject(*kind, *sprite, load(png)?);
		}
		debug!("loaded {} graphics from {}", set.len(), path.display());
		Ok(set)
	}
}

impl TileGraphicsLookup for TileSet {
	fn tile(&self, kind: LayerKind, index: u16) -> Option<&TileGraphic> {
		self.tiles.get(&(kind, index))
	}

	fn object(&self, object: &PlacedObject) -> Option<&TileGraphic> {
		self.objects.get(&(object.kind, object.sprite))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn diamond_rows_widen_then_narrow() {
		let diamond = TileGraphic::diamond(64, 32, 9);
		let rowWidth = |y: usize| diamond.pixels[y * 64..][..64].iter().filter(|&&pixel| pixel == 9).count();
		assert_eq!([rowWidth(0), rowWidth(1), rowWidth(15), rowWidth(16), rowWidth(31)], [4, 8, 64, 64, 4]);
		assert_eq!(diamond.pixels[0], TRANSPARENT_INDEX);
		assert_eq!(diamond.pixels[30], 9);
	}

	#[test]
	fn bitmap_size_must_match() {
		assert!(TileGraphic::new(4, 4, vec![0; 15]).is_err());
		assert!(TileGraphic::new(4, 4, vec![0; 16]).is_ok());
	}

	#[test]
	fn reads_indexed_png() {
		let mut encoded = Vec::new();
		{
			let mut encoder = png::Encoder::new(&mut encoded, 3, 2);
			encoder.set_color(ColorType::Indexed);
			encoder.set_depth(BitDepth::Eight);
			encoder.set_palette(&[0_u8; 3 * 6][..]);
			encoder.write_header().unwrap().write_image_data(&[0, 1, 2, 3, 4, 5]).unwrap();
		}
		let graphic = TileGraphic::fromPNG(encoded.as_slice()).unwrap();
		assert_eq!((graphic.width, graphic.height), (3, 2));
		assert_eq!(graphic.pixels[graphic.width + 2], 5);
	}

	#[test]
	fn objects_resolve_by_kind_and_sprite() {
		let mut set = TileSet::new();
		set.insertObject(ObjectKind::Item, 4, TileGraphic::solid(2, 2, 1));
		let mut item = PlacedObject {
			kind: ObjectKind::Item,
			x: 0,
			y: 0,
			layer: LayerKind::Floor,
			sprite: 4,
			subX: 32,
			subY: 32,
			attributes: crate::level::ObjectAttributes::Item { itemType: 19 },
		};
		assert!(set.object(&item).is_some());
		item.sprite = 5;
		assert!(set.object(&item).is_none());
		assert!(set.tile(LayerKind::Floor, 4).is_none());
	}
}
