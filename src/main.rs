#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::{ensure, Context},
	clap::Parser,
	log::{debug, error, info, warn},
	rayon::prelude::*,
	sc_isomap::{
		archive::ArchiveIndex,
		batch,
		config::RenderConfig,
		graphics::TileSet,
		level::LevelData,
		markup::MarkupCatalogue,
		model::LevelModel,
		palette::PaletteTable,
		render::Renderer,
	},
	std::{
		collections::HashMap,
		fs::{self, File},
		io::{BufReader, BufWriter},
		path::{Path, PathBuf},
	},
};

fn main() -> anyhow::Result<()> {
	/// Renders the levels of a lump archive as isometric PNG maps.
	#[derive(Parser)]
	struct Args {
		/// Lump archive holding the `.map` lumps.
		#[clap(value_parser)]
		archive: PathBuf,

		/// Indexed PNG (a screenshot will do) or a raw 768-byte palette dump.
		#[clap(long, value_parser)]
		palette: PathBuf,

		/// The raw palette dump holds 6-bit VGA components.
		#[clap(long)]
		vgaPalette: bool,

		/// TOML manifest mapping tile and sprite numbers to indexed PNGs.
		#[clap(long, value_parser)]
		tiles: PathBuf,

		/// Markup catalogue. Without one, every level is rendered once, unmodified.
		#[clap(long, value_parser)]
		markup: Option<PathBuf>,

		#[clap(long, value_parser)]
		config: Option<PathBuf>,

		#[clap(long, value_parser, default_value = ".")]
		out: PathBuf,
	}
	let Args { archive, palette, vgaPalette, tiles, markup, config, out } = Args::parse();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let buffer = fs::read(&archive).with_context(|| format!("{}", archive.display()))?;
	let index = ArchiveIndex::open(&buffer).with_context(|| format!("{}", archive.display()))?;
	let palette = loadPalette(&palette, vgaPalette).with_context(|| format!("{}", palette.display()))?;
	let tiles = TileSet::loadManifest(&tiles).with_context(|| format!("{}", tiles.display()))?;
	let config = match &config {
		Some(path) => RenderConfig::load(path).with_context(|| format!("{}", path.display()))?,
		None => RenderConfig::default(),
	};
	let catalogue = markup
		.as_deref()
		.map(|path| MarkupCatalogue::load(path).with_context(|| format!("{}", path.display())))
		.transpose()?;

	let levels: HashMap<String, LevelData> = batch::decodeLevels(&index, &buffer)
		.into_iter()
		.filter_map(|outcome| outcome.level.ok())
		.map(|level| (level.name.clone(), level))
		.collect();

	let jobs: Vec<(String, LevelModel)> = match &catalogue {
		Some(catalogue) => catalogue
			.levels
			.iter()
			.filter_map(|entry| {
				let Some(level) = levels.get(&entry.name.to_ascii_lowercase()) else {
					warn!("catalogue names level {:?}, which the archive does not hold", entry.name);
					return None;
				};
				let fileName = match entry.number {
					Some(number) => format!("{number:02} - {}.png", entry.fullName()),
					None => format!("{}.png", entry.fullName()),
				};
				Some((fileName, LevelModel::new(level.clone(), Some(entry.toOverride(level.width, level.height)))))
			})
			.collect(),
		None => levels.into_values().map(|level| (format!("{}.png", level.name), LevelModel::new(level, None))).collect(),
	};

	fs::create_dir_all(&out).with_context(|| format!("{}", out.display()))?;
	let renderer = Renderer::new(config);
	let failed = jobs
		.par_iter()
		.filter(|(fileName, model)| {
			let result = renderJob(&renderer, model, &palette, &tiles, &out.join(fileName));
			if let Err(err) = &result {
				error!("{fileName}: {err:#}");
			}
			result.is_err()
		})
		.count();
	ensure!(failed == 0, "{failed} of {} maps failed to render", jobs.len());
	Ok(())
}

fn renderJob(
	renderer: &Renderer,
	model: &LevelModel,
	palette: &PaletteTable,
	tiles: &TileSet,
	path: &Path,
) -> anyhow::Result<()> {
	let rendered = renderer.render(model, Some(palette), tiles)?;
	rendered.image.writePNG(BufWriter::new(File::create(path)?))?;
	for label in &rendered.labels {
		debug!("{}: label {:?} at {}", model.name(), label.text, label.position);
	}
	info!(
		"{}: {}x{}, {} missing graphics",
		path.display(),
		rendered.image.width,
		rendered.image.height,
		rendered.gaps.len()
	);
	Ok(())
}

fn loadPalette(path: &Path, vga: bool) -> sc_isomap::Result<PaletteTable> {
	if path.extension().map_or(false, |extension| extension.eq_ignore_ascii_case("png")) {
		return PaletteTable::fromPNG(BufReader::new(File::open(path)?));
	}
	let pal = fs::read(path)?;
	if vga {
		PaletteTable::fromVGA(&pal)
	} else {
		PaletteTable::fromBytes(&pal)
	}
}
