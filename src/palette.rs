use {
	crate::error::{Error, Result},
	std::io::Read,
};

pub const PAL_LEN: usize = 256 * RGB_SIZE;
pub const RGB_SIZE: usize = 3;

/// 256 RGB colours indexed by pixel value.
#[derive(Clone, PartialEq, Eq)]
pub struct PaletteTable {
	colors: Box<[[u8; RGB_SIZE]; 256]>,
}

impl PaletteTable {
	/// Raw `PAL_LEN`-byte RGB triplets.
	pub fn fromBytes(pal: &[u8]) -> Result<Self> {
		if pal.len() != PAL_LEN {
			return Err(Error::format("palette", format!("{} bytes, expected {PAL_LEN}", pal.len())));
		}
		let mut colors = Box::new([[0; RGB_SIZE]; 256]);
		for (color, triplet) in colors.iter_mut().zip(pal.chunks_exact(RGB_SIZE)) {
			color.copy_from_slice(triplet);
		}
		Ok(PaletteTable { colors })
	}

	/// DAC dumps store 6-bit components; they are widened to 8 bits.
	pub fn fromVGA(pal: &[u8]) -> Result<Self> {
		if let Some(&component) = pal.iter().find(|&&component| component > 0x3F) {
			return Err(Error::format("VGA palette", format!("component {component:#x} exceeds 6 bits")));
		}
		let mut table = Self::fromBytes(pal)?;
		for component in table.colors.iter_mut().flatten() {
			*component = (*component << 2) | (*component >> 4);
		}
		Ok(table)
	}

	/// Takes the PLTE chunk of an indexed PNG, such as a screenshot. Short palettes are padded with black.
	pub fn fromPNG(reader: impl Read) -> Result<Self> {
		let png = png::Decoder::new(reader).read_info()?;
		let plte = png.info().palette.as_deref().ok_or_else(|| Error::format("palette PNG", "no PLTE chunk"))?;
		if plte.len() % RGB_SIZE != 0 || plte.len() > PAL_LEN {
			return Err(Error::format("palette PNG", format!("PLTE chunk of {} bytes", plte.len())));
		}
		let mut pal = plte.to_vec();
		pal.resize(PAL_LEN, 0);
		Self::fromBytes(&pal)
	}

	pub fn fromFn(f: impl Fn(u8) -> [u8; RGB_SIZE]) -> Self {
		let mut colors = Box::new([[0; RGB_SIZE]; 256]);
		for (index, color) in (0..=u8::MAX).zip(colors.iter_mut()) {
			*color = f(index);
		}
		PaletteTable { colors }
	}

	pub fn color(&self, index: u8) -> [u8; RGB_SIZE] {
		self.colors[index as usize]
	}

	pub fn toBytes(&self) -> Vec<u8> {
		self.colors.iter().flatten().copied().collect()
	}
}

#[cfg(test)]
mod tests {
	use {super::*, png::ColorType};

	#[test]
	fn reads_raw_triplets() {
		let pal: Vec<u8> = (0..PAL_LEN).map(|i| i as u8).collect();
		let table = PaletteTable::fromBytes(&pal).unwrap();
		assert_eq!(table.color(0), [0, 1, 2]);
		assert_eq!(table.color(1), [3, 4, 5]);
		assert_eq!(table.toBytes(), pal);
		assert!(matches!(PaletteTable::fromBytes(&pal[1..]), Err(Error::Format { .. })));
	}

	#[test]
	fn widens_vga_components() {
		let mut pal = vec![0; PAL_LEN];
		pal[3..6].copy_from_slice(&[0x3F, 0x20, 0x01]);
		let table = PaletteTable::fromVGA(&pal).unwrap();
		assert_eq!(table.color(1), [0xFF, 0x82, 0x04]);
		pal[0] = 0x40;
		assert!(PaletteTable::fromVGA(&pal).is_err());
	}

	#[test]
	fn takes_the_plte_chunk_of_a_png() {
		let mut file = Vec::new();
		{
			let mut encoder = png::Encoder::new(&mut file, 1, 1);
			encoder.set_color(ColorType::Indexed);
			encoder.set_palette(&[10_u8, 20, 30, 40, 50, 60][..]);
			encoder.write_header().unwrap().write_image_data(&[1]).unwrap();
		}
		let table = PaletteTable::fromPNG(file.as_slice()).unwrap();
		assert_eq!(table.color(1), [40, 50, 60]);
		assert_eq!(table.color(2), [0, 0, 0]);
	}
}
