//! Isometric compositing.
//!
//! Cells are projected with `screen = ((x - y) * tileWidth / 2, (x + y) * tileHeight / 2 - layerOffset)`
//! and painted back to front: by increasing `x + y`, and inside a cell floor, wall,
//! ceiling, then the cell's objects in table order.

use {
	crate::{
		config::RenderConfig,
		error::{Error, Result},
		graphics::{TileGraphic, TileGraphicsLookup, TRANSPARENT_INDEX},
		level::{LayerKind, EMPTY_TILE},
		model::{LevelModel, Tile},
		palette::PaletteTable,
	},
	glam::IVec2,
	log::warn,
	png::ColorType,
	std::io::Write,
};

/// Sub-cell coordinates run from 0 to this value, exclusive.
pub const SUBCELL_RANGE: i32 = 64;

pub const RGBA_SIZE: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlitSource {
	Tile { layer: LayerKind, index: u16 },
	/// Position of the object in the level's object table.
	Object { index: usize },
}

/// One bitmap placed on the canvas.
#[derive(Clone, Copy, Debug)]
pub struct Blit<'g> {
	pub cell: (usize, usize),
	pub source: BlitSource,
	/// Top-left corner in canvas pixels.
	pub position: IVec2,
	pub graphic: &'g TileGraphic,
}

/// An index the graphics lookup had nothing for. It renders as transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gap {
	pub cell: (usize, usize),
	pub source: BlitSource,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelAnchor {
	pub cell: (usize, usize),
	pub text: String,
	/// Centre of the cell's floor diamond in canvas pixels.
	pub position: IVec2,
}

/// Everything `render` will paint, in painting order.
#[derive(Debug)]
pub struct DrawPlan<'g> {
	pub width: usize,
	pub height: usize,
	pub blits: Vec<Blit<'g>>,
	pub gaps: Vec<Gap>,
	pub labels: Vec<LabelAnchor>,
}

/// RGBA8 raster, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
	pub width: usize,
	pub height: usize,
	pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct Rendered {
	pub image: RasterImage,
	pub gaps: Vec<Gap>,
	pub labels: Vec<LabelAnchor>,
}

impl RasterImage {
	pub fn filled(width: usize, height: usize, color: [u8; RGBA_SIZE]) -> Self {
		RasterImage { width, height, data: color.repeat(width * height) }
	}

	pub fn pixel(&self, x: usize, y: usize) -> [u8; RGBA_SIZE] {
		let i = (y * self.width + x) * RGBA_SIZE;
		[self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
	}

	pub fn writePNG(&self, writer: impl Write) -> Result<()> {
		let mut png = png::Encoder::new(writer, self.width as _, self.height as _);
		png.set_color(ColorType::Rgba);
		png.write_header()?.write_image_data(&self.data)?;
		Ok(())
	}
}

pub struct Renderer {
	config: RenderConfig,
}

impl Renderer {
	pub fn new(config: RenderConfig) -> Self {
		Renderer { config }
	}

	/// Screen position of the top corner of cell `(x, y)`'s bounding box on `layer`, before canvas shifting.
	pub fn project(&self, x: usize, y: usize, layer: LayerKind) -> IVec2 {
		let (x, y) = (x as i32, y as i32);
		let (tileWidth, tileHeight) = (self.config.tileWidth as i32, self.config.tileHeight as i32);
		IVec2::new((x - y) * (tileWidth / 2), (x + y) * (tileHeight / 2) - self.config.layerOffsets.get(layer))
	}

	pub fn plan<'g>(&self, model: &LevelModel, graphics: &'g impl TileGraphicsLookup) -> DrawPlan<'g> {
		let (tileWidth, tileHeight) = (self.config.tileWidth as i32, self.config.tileHeight as i32);
		let (mut blits, mut gaps, mut labels) = (Vec::new(), Vec::new(), Vec::new());
		let mut place = |cell, source, graphic: Option<&'g TileGraphic>, anchor: &dyn Fn(&TileGraphic) -> IVec2| {
			match graphic {
				Some(graphic) => blits.push(Blit { cell, source, position: anchor(graphic), graphic }),
				None => {
					warn!("{}: no graphic for {source:?} at {cell:?}", model.name());
					gaps.push(Gap { cell, source });
				}
			}
		};

		for (x, y) in model.cellsBackToFront() {
			for text in model.labelsAt(x, y) {
				let screen = self.project(x, y, LayerKind::Floor);
				labels.push(LabelAnchor {
					cell: (x, y),
					text: text.to_owned(),
					position: screen + IVec2::new(tileWidth / 2, tileHeight / 2),
				});
			}
			if model.isVoid(x, y) {
				continue;
			}
			for layer in LayerKind::ALL {
				let index = match model.tileAt(x, y, layer) {
					Tile::Index(EMPTY_TILE) | Tile::Void => continue,
					Tile::Index(index) => index,
				};
				let screen = self.project(x, y, layer);
				// tiles taller than a cell grow upwards from the cell's bottom edge
				place((x, y), BlitSource::Tile { layer, index }, graphics.tile(layer, index), &|graphic: &TileGraphic| {
					IVec2::new(screen.x, screen.y + tileHeight - graphic.height as i32)
				});
			}
			for (index, object) in model.data().objects.iter().enumerate() {
				if object.x != x || object.y != y {
					continue;
				}
				let screen = self.project(x, y, object.layer);
				let (subX, subY) = (object.subX as i32, object.subY as i32);
				let foot = IVec2::new(
					screen.x + tileWidth / 2 + (subX - subY) * tileWidth / (2 * SUBCELL_RANGE),
					screen.y + (subX + subY) * tileHeight / (2 * SUBCELL_RANGE),
				);
				place((x, y), BlitSource::Object { index }, graphics.object(object), &|graphic: &TileGraphic| {
					foot - IVec2::new(graphic.width as i32 / 2, graphic.height as i32)
				});
			}
		}

		let (topLeft, bottomRight) = match blits.first() {
			None => (IVec2::ZERO, IVec2::new(tileWidth, tileHeight)),
			Some(_) => blits.iter().fold((IVec2::splat(i32::MAX), IVec2::splat(i32::MIN)), |(min, max), blit| {
				let size = IVec2::new(blit.graphic.width as i32, blit.graphic.height as i32);
				(min.min(blit.position), max.max(blit.position + size))
			}),
		};
		for blit in &mut blits {
			blit.position -= topLeft;
		}
		for label in &mut labels {
			label.position -= topLeft;
		}
		let size = (bottomRight - topLeft).max(IVec2::ONE);
		DrawPlan { width: size.x as _, height: size.y as _, blits, gaps, labels }
	}

	pub fn render(
		&self,
		model: &LevelModel,
		palette: Option<&PaletteTable>,
		graphics: &impl TileGraphicsLookup,
	) -> Result<Rendered> {
		let palette = palette.ok_or(Error::MissingPalette)?;
		let DrawPlan { width, height, blits, gaps, labels } = self.plan(model, graphics);
		let background = model.markup().background.unwrap_or(self.config.background);
		let mut image = RasterImage::filled(width, height, background);
		for blit in &blits {
			let &TileGraphic { width: graphicWidth, height: graphicHeight, ref pixels } = blit.graphic;
			if graphicWidth == 0 {
				continue;
			}
			let (left, top) = (blit.position.x as usize, blit.position.y as usize);
			for (row, line) in pixels.chunks_exact(graphicWidth).enumerate().take(graphicHeight) {
				let rowStart = ((top + row) * width + left) * RGBA_SIZE;
				let destination = &mut image.data[rowStart..][..graphicWidth * RGBA_SIZE];
				for (&index, pixel) in line.iter().zip(destination.chunks_exact_mut(RGBA_SIZE)) {
					if index != TRANSPARENT_INDEX {
						let [r, g, b] = palette.color(index);
						pixel.copy_from_slice(&[r, g, b, u8::MAX]);
					}
				}
			}
		}
		Ok(Rendered { image, gaps, labels })
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			graphics::TileSet,
			level::{LevelData, MapLayer, ObjectAttributes, ObjectKind, PlacedObject},
			markup::{Directive, MarkupOverride},
		},
	};

	const RED: u8 = 10;
	const BLUE: u8 = 20;
	const GREEN: u8 = 30;
	const CLEAR: [u8; 4] = [0; 4];

	fn palette() -> PaletteTable {
		PaletteTable::fromFn(|index| match index {
			RED => [255, 0, 0],
			BLUE => [0, 0, 255],
			GREEN => [0, 255, 0],
			other => [other, other, other],
		})
	}

	fn renderer() -> Renderer {
		Renderer::new(RenderConfig { tileWidth: 8, tileHeight: 4, ..RenderConfig::default() })
	}

	fn tiles() -> TileSet {
		let mut set = TileSet::new();
		set.insertTile(LayerKind::Floor, 1, TileGraphic::diamond(8, 4, RED))
			.insertTile(LayerKind::Floor, 2, TileGraphic::diamond(8, 4, BLUE))
			.insertObject(ObjectKind::Item, 0, TileGraphic::solid(2, 2, GREEN));
		set
	}

	fn level(floor: Vec<u16>, objects: Vec<PlacedObject>) -> LevelData {
		LevelData {
			name: "scenario".into(),
			width: 2,
			height: 2,
			layers: vec![MapLayer::new(LayerKind::Floor, 2, 2, floor).unwrap()],
			objects,
		}
	}

	fn item(x: usize, y: usize) -> PlacedObject {
		PlacedObject {
			kind: ObjectKind::Item,
			x,
			y,
			layer: LayerKind::Floor,
			sprite: 0,
			subX: 32,
			subY: 32,
			attributes: ObjectAttributes::Item { itemType: 1 },
		}
	}

	const RGB_RED: [u8; 4] = [255, 0, 0, 255];
	const RGB_BLUE: [u8; 4] = [0, 0, 255, 255];

	#[test]
	fn red_row_sits_behind_blue_row() {
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![]), None);
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		let image = &rendered.image;
		assert_eq!((image.width, image.height), (16, 8));
		assert_eq!(image.pixel(8, 1), RGB_RED); // (0, 0)
		assert_eq!(image.pixel(14, 3), RGB_RED); // (1, 0)
		assert_eq!(image.pixel(2, 3), RGB_BLUE); // (0, 1)
		assert_eq!(image.pixel(8, 5), RGB_BLUE); // (1, 1)
		assert_eq!(image.pixel(0, 0), CLEAR);
		assert!(rendered.gaps.is_empty());
	}

	#[test]
	fn first_blit_is_the_far_corner() {
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![]), None);
		let tiles = tiles();
		let plan = renderer().plan(&model, &tiles);
		let cells: Vec<_> = plan.blits.iter().map(|blit| blit.cell).collect();
		assert_eq!(cells, [(0, 0), (1, 0), (0, 1), (1, 1)]);
	}

	#[test]
	fn blank_cells_leave_no_pixels() {
		let mut markup = MarkupOverride::default();
		markup.add(1, 0, Directive::Blank);
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![item(1, 0)]), Some(markup));
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		let tiles = tiles();
		assert!(renderer().plan(&model, &tiles).blits.iter().all(|blit| blit.cell != (1, 0)));
		// same picture as a level that never had anything there
		let bare = LevelModel::new(level(vec![1, 0, 2, 2], vec![]), None);
		assert_eq!(rendered.image, renderer().render(&bare, Some(&palette()), &tiles).unwrap().image);
		// the decoded tile is still there for diagnostics
		assert_eq!(model.data().layer(LayerKind::Floor).unwrap().get(1, 0), Some(1));
	}

	#[test]
	fn objects_follow_their_cell_floor() {
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![item(1, 0), item(0, 0)]), None);
		let tiles = tiles();
		let plan = renderer().plan(&model, &tiles);
		let sources: Vec<_> = plan.blits.iter().map(|blit| (blit.cell, blit.source)).collect();
		let floor = |index| BlitSource::Tile { layer: LayerKind::Floor, index };
		assert_eq!(
			sources,
			[
				((0, 0), floor(1)),
				((0, 0), BlitSource::Object { index: 1 }),
				((1, 0), floor(1)),
				((1, 0), BlitSource::Object { index: 0 }),
				((0, 1), floor(2)),
				((1, 1), floor(2)),
			]
		);
	}

	#[test]
	fn centred_object_stands_on_the_diamond_centre() {
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![item(0, 0)]), None);
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		// floor diamond of (0, 0) spans x 4..12, y 0..4; its centre is (8, 2)
		assert_eq!(rendered.image.pixel(7, 0), [0, 255, 0, 255]);
		assert_eq!(rendered.image.pixel(8, 1), [0, 255, 0, 255]);
		assert_eq!(rendered.image.pixel(8, 2), RGB_RED);
	}

	#[test]
	fn missing_graphics_become_gaps() {
		let model = LevelModel::new(level(vec![1, 3, 2, 2], vec![]), None);
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		assert_eq!(rendered.gaps, [Gap { cell: (1, 0), source: BlitSource::Tile { layer: LayerKind::Floor, index: 3 } }]);
		// the canvas shrinks to what was drawn
		assert_eq!(rendered.image.width, 12);
		assert_eq!(rendered.image.pixel(8, 1), RGB_RED);
	}

	#[test]
	fn empty_tiles_are_not_gaps() {
		let model = LevelModel::new(level(vec![0, 0, 0, 0], vec![]), None);
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		assert!(rendered.gaps.is_empty());
		assert_eq!((rendered.image.width, rendered.image.height), (8, 4));
	}

	#[test]
	fn palette_is_required() {
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![]), None);
		assert!(matches!(renderer().render(&model, None, &tiles()), Err(Error::MissingPalette)));
	}

	#[test]
	fn rendering_is_repeatable() {
		let model = LevelModel::new(level(vec![1, 2, 2, 1], vec![item(1, 1)]), None);
		let (renderer, palette, tiles) = (renderer(), palette(), tiles());
		let first = renderer.render(&model, Some(&palette), &tiles).unwrap();
		let second = renderer.render(&model, Some(&palette), &tiles).unwrap();
		assert_eq!(first.image, second.image);
	}

	#[test]
	fn labels_anchor_on_the_cell_centre() {
		let mut markup = MarkupOverride::default();
		markup.add(0, 0, Directive::Label("Start".into()));
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![]), Some(markup));
		let rendered = renderer().render(&model, Some(&palette()), &tiles()).unwrap();
		assert_eq!(
			rendered.labels,
			[LabelAnchor { cell: (0, 0), text: "Start".into(), position: IVec2::new(8, 2) }]
		);
	}

	#[test]
	fn labels_survive_on_blank_cells() {
		let mut markup = MarkupOverride::default();
		markup.add(1, 1, Directive::Blank).add(1, 1, Directive::Label("Hidden".into()));
		let model = LevelModel::new(level(vec![1, 1, 2, 2], vec![]), Some(markup));
		let tiles = tiles();
		let plan = renderer().plan(&model, &tiles);
		assert!(plan.blits.iter().all(|blit| blit.cell != (1, 1)));
		assert_eq!(
			plan.labels,
			[LabelAnchor { cell: (1, 1), text: "Hidden".into(), position: IVec2::new(8, 6) }]
		);
	}

	#[test]
	fn layers_stack_floor_wall_ceiling_then_objects() {
		let cell = |kind| MapLayer::new(kind, 1, 1, vec![1]).unwrap();
		let model = LevelModel::new(
			LevelData {
				name: "stack".into(),
				width: 1,
				height: 1,
				layers: vec![cell(LayerKind::Floor), cell(LayerKind::Wall), cell(LayerKind::Ceiling)],
				objects: vec![item(0, 0)],
			},
			None,
		);
		let mut tiles = TileSet::new();
		tiles
			.insertTile(LayerKind::Floor, 1, TileGraphic::diamond(8, 4, RED))
			.insertTile(LayerKind::Wall, 1, TileGraphic::solid(8, 8, BLUE))
			.insertTile(LayerKind::Ceiling, 1, TileGraphic::diamond(8, 4, RED))
			.insertObject(ObjectKind::Item, 0, TileGraphic::solid(2, 2, GREEN));
		let plan = renderer().plan(&model, &tiles);
		let placed: Vec<_> = plan.blits.iter().map(|blit| (blit.source, blit.position.to_array())).collect();
		let tile = |layer| BlitSource::Tile { layer, index: 1 };
		// floor lowered by 16, ceiling raised by 64, the wall grows up from the cell's bottom edge
		assert_eq!(
			placed,
			[
				(tile(LayerKind::Floor), [0, 80]),
				(tile(LayerKind::Wall), [0, 60]),
				(tile(LayerKind::Ceiling), [0, 0]),
				(BlitSource::Object { index: 0 }, [3, 80]),
			]
		);
		assert_eq!((plan.width, plan.height), (8, 84));
	}

	#[test]
	fn encodes_png() {
		let image = RasterImage::filled(3, 2, [1, 2, 3, 4]);
		let mut encoded = Vec::new();
		image.writePNG(&mut encoded).unwrap();
		assert_eq!(&encoded[1..4], b"PNG");
	}
}
