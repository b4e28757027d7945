use std::env;
use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    ensure_icon(&manifest_dir).expect("failed to prepare shell icon");

    tauri_build::build();
}

/// Synthesize a placeholder icon when none is checked in.
fn ensure_icon(manifest_dir: &Path) -> Result<(), Box<dyn Error>> {
    let icon_dir = manifest_dir.join("icons");
    let icon_png = icon_dir.join("icon.png");
    if fs::metadata(&icon_png).is_err() {
        fs::create_dir_all(&icon_dir)?;
        let file = fs::File::create(&icon_png)?;
        let w = BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, 1, 1);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        let data: [u8; 4] = [255, 255, 255, 255];
        writer.write_image_data(&data)?;
    }
    Ok(())
}
