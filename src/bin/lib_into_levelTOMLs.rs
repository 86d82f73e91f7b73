#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::Context,
	clap::Parser,
	log::info,
	sc_isomap::{archive::ArchiveIndex, batch, level, stdoutRaw},
	std::{fs, io::Write, path::PathBuf},
};

fn main() -> anyhow::Result<()> {
	/// Dumps decoded levels as TOML: one named level to stdout, or every level into a directory.
	#[derive(Parser)]
	struct Args {
		#[clap(value_parser)]
		archive: PathBuf,

		/// Lump to dump to stdout, e.g. `RUINSA.MAP`.
		#[clap(value_parser)]
		lump: Option<String>,

		#[clap(long, value_parser, default_value = ".")]
		out: PathBuf,
	}
	let Args { archive, lump, out } = Args::parse();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let buffer = fs::read(&archive).with_context(|| format!("{}", archive.display()))?;
	let index = ArchiveIndex::open(&buffer).with_context(|| format!("{}", archive.display()))?;

	if let Some(lump) = lump {
		let entry = index.lookup(&lump)?;
		let level = level::decode(&entry.name, &entry.resource(&buffer)?)?;
		stdoutRaw().write_all(toml::to_string_pretty(&level)?.as_bytes())?;
		return Ok(());
	}

	fs::create_dir_all(&out).with_context(|| format!("{}", out.display()))?;
	for outcome in batch::decodeLevels(&index, &buffer) {
		// failures are already logged by the batch
		let Ok(level) = outcome.level else { continue };
		let path = out.join(format!("{}.toml", level.name));
		fs::write(&path, toml::to_string_pretty(&level)?).with_context(|| format!("{}", path.display()))?;
		info!("{} -> {}", outcome.entry.name, path.display());
	}
	Ok(())
}
