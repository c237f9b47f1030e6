//! Offline conversion: `.xraw` volume to a canonically named PNG texture.

use std::path::{Path, PathBuf};

use voxelize_xraw::{encode, encode_png, read_xraw};

use crate::error::BakeError;
use crate::report::{BakeReport, HeaderReport};

#[derive(Debug, Clone)]
pub struct BakeOptions {
    pub out_dir: PathBuf,
    /// Also write `<canonical name>.ron` with the texture metadata.
    pub sidecar: bool,
}

/// Write `bytes` to `path` through a temporary sibling, so a failed write
/// never leaves a partial file under the final name.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BakeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let result = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Source name of an input file: its stem, or `"volume"` when it has none.
pub fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "volume".to_string())
}

/// Decode `input`, pack it into a texture and persist it under its canonical name.
pub fn bake_file(input: &Path, options: &BakeOptions) -> Result<BakeReport, BakeError> {
    let file = std::fs::File::open(input)?;
    let volume =
        read_xraw(std::io::BufReader::new(file)).map_err(|e| BakeError::format(input, e))?;
    let header = HeaderReport::from(&volume.header);
    log::info!(
        "{}: magic {}, channel type {}, {} channels, {} bits/channel, {} bits/index",
        input.display(),
        header.magic,
        header.color_channel_type,
        header.num_channels,
        header.bits_per_channel,
        header.bits_per_index
    );

    let texture = encode(&volume, &source_name(input)).map_err(|e| BakeError::format(input, e))?;
    let dims = texture.dims();

    let mut report = BakeReport {
        source: input.display().to_string(),
        canonical_name: texture.canonical_name.clone(),
        header,
        texture_width: dims.width,
        texture_height: dims.height,
        encode: texture.stats,
        output: None,
        sidecar: None,
    };

    if dims.is_empty() {
        log::warn!("{}: volume is empty, no texture written", input.display());
        return Ok(report);
    }

    let png = encode_png(&texture).map_err(|e| BakeError::format(input, e))?;
    let png_path = options.out_dir.join(format!("{}.png", texture.canonical_name));
    write_atomic(&png_path, &png)?;
    log::info!("Wrote {}", png_path.display());
    report.output = Some(png_path.display().to_string());

    if options.sidecar {
        let ron_path = options.out_dir.join(format!("{}.ron", texture.canonical_name));
        write_atomic(&ron_path, texture.metadata.to_sidecar()?.as_bytes())?;
        report.sidecar = Some(ron_path.display().to_string());
    }

    Ok(report)
}
