use upng::{image::Bitmap, PngDecoder, RGBA8};

fn main() {
  let args: Vec<String> = std::env::args().collect();
  let (in_path, out_path) = match args.as_slice() {
    [_, in_path, out_path] => (in_path, out_path),
    _ => {
      println!("usage: png2tga <in.png> <out.tga>");
      std::process::exit(1);
    }
  };

  let mut decoder = PngDecoder::from_file(in_path);
  if let Err(e) = decoder.decode() {
    println!("`{in_path}`: {e}");
    std::process::exit(2);
  }
  println!(
    "`{in_path}`: {}x{}, {} bits per channel, {:?}",
    decoder.width(),
    decoder.height(),
    decoder.bit_depth(),
    decoder.format()
  );
  let bitmap = match Bitmap::<RGBA8>::try_from_decoder(&decoder) {
    Ok(bitmap) => bitmap,
    Err(e) => {
      println!("`{in_path}`: {e}");
      std::process::exit(2);
    }
  };
  decoder.teardown();
  if bitmap.width > u32::from(u16::MAX) || bitmap.height > u32::from(u16::MAX) {
    println!("{}x{} is too big for a TGA", bitmap.width, bitmap.height);
    std::process::exit(2);
  }

  match std::fs::write(out_path, tga_bytes(&bitmap)) {
    Ok(()) => println!("wrote `{out_path}`"),
    Err(e) => {
      println!("`{out_path}`: {e}");
      std::process::exit(3);
    }
  }
}

/// An uncompressed 32-bit TGA, stored top to bottom.
fn tga_bytes(bitmap: &Bitmap<RGBA8>) -> Vec<u8> {
  let mut out = Vec::with_capacity(18 + bitmap.pixels.len() * 4);
  // id length, no color map, uncompressed true-color
  out.extend_from_slice(&[0, 0, 2]);
  // color map spec (unused)
  out.extend_from_slice(&[0; 5]);
  // x and y origin
  out.extend_from_slice(&[0; 4]);
  out.extend_from_slice(&(bitmap.width as u16).to_le_bytes());
  out.extend_from_slice(&(bitmap.height as u16).to_le_bytes());
  out.push(32);
  // 8 alpha bits, top-left origin
  out.push(0x28);
  for RGBA8 { r, g, b, a } in bitmap.pixels.iter().copied() {
    out.extend_from_slice(&[b, g, r, a]);
  }
  out
}
