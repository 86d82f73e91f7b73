#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

pub mod archive;
pub mod batch;
pub mod config;
pub mod error;
pub mod graphics;
pub mod level;
pub mod markup;
pub mod model;
pub mod palette;
pub mod render;
pub mod rle;

pub use error::{Error, Result};

use std::fs::File;

#[cfg(unix)]
pub fn stdoutRaw() -> File {
	use std::os::unix::io::FromRawFd;
	unsafe { File::from_raw_fd(1) }
}

#[cfg(windows)]
pub fn stdoutRaw() -> File {
	use std::{
		io,
		os::windows::io::{AsRawHandle, FromRawHandle},
	};
	unsafe { File::from_raw_handle(io::stdout().as_raw_handle()) }
}
