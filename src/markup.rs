//! Hand-authored level markup: blanked regions, labels and tile fixes.
//!
//! None of this can be derived from the lumps; it is read from a TOML
//! catalogue and applied read-only when a level is queried.

use {
	crate::{error::Result, level::LayerKind},
	serde::Deserialize,
	std::{collections::HashMap, fs, path::Path},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
	/// Hide the cell and everything on it.
	Blank,
	Label(String),
	/// Force one layer's value at this cell.
	SetTile { layer: LayerKind, tile: u16 },
}

#[derive(Clone, Debug, Default)]
pub struct MarkupOverride {
	cells: HashMap<(usize, usize), Vec<Directive>>,
	replacements: HashMap<(LayerKind, u16), u16>,

	/// RGBA canvas colour; the render config's background when absent.
	pub background: Option<[u8; 4]>,
}

impl MarkupOverride {
	pub fn add(&mut self, x: usize, y: usize, directive: Directive) -> &mut Self {
		self.cells.entry((x, y)).or_default().push(directive);
		self
	}

	/// Replaces every `from` value of `layer` by `to`, wherever it occurs.
	pub fn replace(&mut self, layer: LayerKind, from: u16, to: u16) -> &mut Self {
		self.replacements.insert((layer, from), to);
		self
	}

	pub fn directivesAt(&self, x: usize, y: usize) -> impl Iterator<Item = &Directive> + '_ {
		self.cells.get(&(x, y)).into_iter().flatten()
	}

	pub fn replacement(&self, layer: LayerKind, value: u16) -> Option<u16> {
		self.replacements.get(&(layer, value)).copied()
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct MarkupCatalogue {
	#[serde(default, rename = "level")]
	pub levels: Vec<LevelMarkup>,
}

/// One rendered variant of a level. A level may appear several times with different suffixes.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelMarkup {
	pub name: String,

	/// Number shown by the in-game automap, used to prefix output names.
	pub number: Option<u32>,

	#[serde(default)]
	pub suffix: String,

	pub background: Option<[u8; 4]>,

	#[serde(default)]
	pub blank: Vec<CellRect>,

	#[serde(default)]
	pub labels: Vec<Label>,

	#[serde(default)]
	pub changes: Vec<Change>,

	#[serde(default)]
	pub replacements: Vec<Replacement>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CellRect {
	pub x: usize,
	pub y: usize,

	#[serde(default = "one")]
	pub width: usize,

	#[serde(default = "one")]
	pub height: usize,
}

fn one() -> usize {
	1
}

#[derive(Clone, Debug, Deserialize)]
pub struct Label {
	pub x: usize,
	pub y: usize,
	pub text: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Change {
	pub x: usize,
	pub y: usize,
	pub layer: LayerKind,
	pub tile: u16,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Replacement {
	pub layer: LayerKind,
	pub from: u16,
	pub to: u16,
}

impl MarkupCatalogue {
	pub fn load(path: &Path) -> Result<Self> {
		Self::parse(&fs::read_to_string(path)?)
	}

	pub fn parse(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	/// First catalogue entry for `levelName`, as a ready override for a `width` x `height` grid.
	pub fn overrideFor(&self, levelName: &str, width: usize, height: usize) -> Option<MarkupOverride> {
		self.levels
			.iter()
			.find(|level| level.name.eq_ignore_ascii_case(levelName))
			.map(|level| level.toOverride(width, height))
	}
}

impl LevelMarkup {
	pub fn fullName(&self) -> String {
		format!("{}{}", self.name, self.suffix)
	}

	/// Blank regions are clipped to the `width` x `height` grid; cells past it are void anyway.
	pub fn toOverride(&self, width: usize, height: usize) -> MarkupOverride {
		let mut markup = MarkupOverride { background: self.background, ..MarkupOverride::default() };
		for rect in &self.blank {
			for y in rect.y..rect.y.saturating_add(rect.height).min(height) {
				for x in rect.x..rect.x.saturating_add(rect.width).min(width) {
					markup.add(x, y, Directive::Blank);
				}
			}
		}
		for Label { x, y, text } in &self.labels {
			markup.add(*x, *y, Directive::Label(text.clone()));
		}
		for &Change { x, y, layer, tile } in &self.changes {
			markup.add(x, y, Directive::SetTile { layer, tile });
		}
		for &Replacement { layer, from, to } in &self.replacements {
			markup.replace(layer, from, to);
		}
		markup
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CATALOGUE: &str = r#"
		[[level]]
		name = "ruinadrn"
		number = 2
		suffix = " (wet)"
		background = [32, 32, 32, 255]
		blank = [{ x = 16, y = 4, width = 13, height = 8 }, { x = 0, y = 0 }]
		labels = [{ x = 1, y = 6, text = "Start" }]
		changes = [{ x = 3, y = 4, layer = "wall", tile = 0 }]
		replacements = [{ layer = "floor", from = 12, to = 1 }]

		[[level]]
		name = "ruinadrn"
		suffix = " (dry)"
	"#;

	#[test]
	fn parses_catalogue_entries() {
		let catalogue = MarkupCatalogue::parse(CATALOGUE).unwrap();
		assert_eq!(catalogue.levels.len(), 2);
		let wet = &catalogue.levels[0];
		assert_eq!(wet.fullName(), "ruinadrn (wet)");
		assert_eq!(wet.number, Some(2));
		assert_eq!(catalogue.levels[1].number, None);
	}

	#[test]
	fn builds_overrides_from_entries() {
		let markup = MarkupCatalogue::parse(CATALOGUE).unwrap().overrideFor("RUINADRN", 32, 32).unwrap();
		assert_eq!(markup.background, Some([32, 32, 32, 255]));
		assert_eq!(markup.directivesAt(16, 4).collect::<Vec<_>>(), [&Directive::Blank]);
		assert_eq!(markup.directivesAt(28, 11).count(), 1);
		assert_eq!(markup.directivesAt(29, 11).count(), 0);
		assert_eq!(markup.directivesAt(0, 0).count(), 1);
		assert_eq!(
			markup.directivesAt(3, 4).collect::<Vec<_>>(),
			[&Directive::SetTile { layer: LayerKind::Wall, tile: 0 }]
		);
		assert_eq!(markup.replacement(LayerKind::Floor, 12), Some(1));
		assert_eq!(markup.replacement(LayerKind::Wall, 12), None);
	}

	#[test]
	fn blank_regions_are_clipped_to_the_grid() {
		let catalogue = MarkupCatalogue::parse(&format!(
			"[[level]]\nname = \"huge\"\nblank = [{{ x = 30, y = 1, width = {}, height = 2 }}]\n",
			i64::MAX
		))
		.unwrap();
		let markup = catalogue.overrideFor("huge", 32, 32).unwrap();
		assert_eq!(markup.directivesAt(31, 2).count(), 1);
		assert_eq!(markup.directivesAt(32, 2).count(), 0);
		assert_eq!(markup.cells.len(), 4);
	}

	#[test]
	fn unknown_level_has_no_override() {
		assert!(MarkupCatalogue::parse(CATALOGUE).unwrap().overrideFor("ruinsb", 32, 32).is_none());
	}
}
