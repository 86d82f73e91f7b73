use {
	crate::{error::Result, level::LayerKind},
	serde::{Deserialize, Serialize},
	std::{fs, path::Path},
};

/// Projection and canvas settings. Every field has a default, so an empty TOML file is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
	pub tileWidth: usize,
	pub tileHeight: usize,
	pub layerOffsets: LayerOffsets,

	/// RGBA colour of pixels nothing was drawn on.
	pub background: [u8; 4],
}

/// Upward shift of each layer in pixels, relative to the cell's ground position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerOffsets {
	pub floor: i32,
	pub wall: i32,
	pub ceiling: i32,
}

impl Default for RenderConfig {
	fn default() -> Self {
		RenderConfig { tileWidth: 128, tileHeight: 64, layerOffsets: LayerOffsets::default(), background: [0; 4] }
	}
}

impl Default for LayerOffsets {
	fn default() -> Self {
		LayerOffsets { floor: -16, wall: 0, ceiling: 64 }
	}
}

impl LayerOffsets {
	pub fn get(&self, kind: LayerKind) -> i32 {
		match kind {
			LayerKind::Floor => self.floor,
			LayerKind::Wall => self.wall,
			LayerKind::Ceiling => self.ceiling,
		}
	}
}

impl RenderConfig {
	pub fn load(path: &Path) -> Result<Self> {
		Self::parse(&fs::read_to_string(path)?)
	}

	pub fn parse(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}
}
