#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::Context,
	clap::Parser,
	sc_isomap::{
		archive::Builder,
		level::{self, LevelData},
		stdoutRaw,
	},
	std::{fs, io::Write, path::PathBuf},
};

fn main() -> anyhow::Result<()> {
	/// Packs level TOML dumps back into an `SLIB` archive written to stdout.
	#[derive(Parser)]
	struct Args {
		/// Store the level bodies RLE-compressed.
		#[clap(long)]
		compress: bool,

		#[clap(value_parser, required = true, value_name = "LEVEL_TOML")]
		levelTOMLs: Vec<PathBuf>,
	}
	let Args { compress, levelTOMLs } = Args::parse();
	env_logger::init();

	let mut builder = Builder::new();
	for path in &levelTOMLs {
		let level: LevelData = toml::from_str(&fs::read_to_string(path).with_context(|| format!("{}", path.display()))?)
			.with_context(|| format!("{}", path.display()))?;
		let body = level::encode(&level)?;
		let lumpName = format!("{}.MAP", level.name.to_ascii_uppercase());
		if compress {
			builder.addCompressed(&lumpName, &body);
		} else {
			builder.add(&lumpName, body);
		}
	}
	stdoutRaw().write_all(&builder.build()?)?;
	Ok(())
}
