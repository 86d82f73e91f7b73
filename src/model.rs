use crate::{
	level::{LayerKind, LevelData, PlacedObject, EMPTY_TILE},
	markup::{Directive, MarkupOverride},
};

/// A tile value as seen by the renderer once markup has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
	/// Hidden by markup or outside the grid. Draws nothing at all.
	Void,
	Index(u16),
}

/// One decoded level plus the manual markup that applies to it.
///
/// The decoded data is never rewritten; overrides are resolved on every query.
#[derive(Clone, Debug)]
pub struct LevelModel {
	data: LevelData,
	markup: MarkupOverride,
}

impl LevelModel {
	pub fn new(data: LevelData, markup: Option<MarkupOverride>) -> Self {
		LevelModel { data, markup: markup.unwrap_or_default() }
	}

	pub fn data(&self) -> &LevelData {
		&self.data
	}

	pub fn markup(&self) -> &MarkupOverride {
		&self.markup
	}

	pub fn name(&self) -> &str {
		&self.data.name
	}

	pub fn width(&self) -> usize {
		self.data.width
	}

	pub fn height(&self) -> usize {
		self.data.height
	}

	pub fn isVoid(&self, x: usize, y: usize) -> bool {
		x >= self.data.width || y >= self.data.height || self.markup.directivesAt(x, y).any(|d| *d == Directive::Blank)
	}

	pub fn tileAt(&self, x: usize, y: usize, kind: LayerKind) -> Tile {
		if self.isVoid(x, y) {
			return Tile::Void;
		}
		let decoded = self.data.layer(kind).and_then(|layer| layer.get(x, y)).unwrap_or(EMPTY_TILE);
		// replacements match the decoded value and win over per-cell changes
		let tile = self.markup.replacement(kind, decoded).unwrap_or_else(|| {
			self.markup
				.directivesAt(x, y)
				.find_map(|directive| match *directive {
					Directive::SetTile { layer, tile } if layer == kind => Some(tile),
					_ => None,
				})
				.unwrap_or(decoded)
		});
		Tile::Index(tile)
	}

	/// Objects placed at `(x, y)`, in object table order.
	pub fn objectsAt(&self, x: usize, y: usize) -> impl Iterator<Item = &PlacedObject> + '_ {
		let visible = !self.isVoid(x, y);
		self.data.objects.iter().filter(move |object| visible && object.x == x && object.y == y)
	}

	pub fn labelsAt(&self, x: usize, y: usize) -> impl Iterator<Item = &str> + '_ {
		self.markup.directivesAt(x, y).filter_map(|directive| match directive {
			Directive::Label(text) => Some(text.as_str()),
			_ => None,
		})
	}

	/// Every cell in back-to-front order: increasing `x + y`, then increasing `y`.
	pub fn cellsBackToFront(&self) -> impl Iterator<Item = (usize, usize)> {
		let (width, height) = (self.data.width, self.data.height);
		let depths = if width == 0 || height == 0 { 0 } else { width + height - 1 };
		(0..depths).flat_map(move |depth| {
			let firstY = depth.saturating_sub(width - 1);
			let lastY = depth.min(height - 1);
			(firstY..=lastY).map(move |y| (depth - y, y))
		})
	}
}
