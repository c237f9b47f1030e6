use std::path::Path;

use voxelize_compute::VoxelizeStats;
use voxelize_xraw::{EncodeStats, EncodedVoxelTexture, XRawHeader};

use crate::error::BakeError;

/// Header fields of a decoded volume, as shown to the user.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HeaderReport {
    pub magic: String,
    pub color_channel_type: u8,
    pub num_channels: u8,
    pub bits_per_channel: u8,
    pub bits_per_index: u8,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub palette_count: i32,
}

impl From<&XRawHeader> for HeaderReport {
    fn from(header: &XRawHeader) -> Self {
        Self {
            magic: header.magic_str(),
            color_channel_type: header.color_channel_type,
            num_channels: header.num_channels,
            bits_per_channel: header.bits_per_channel,
            bits_per_index: header.bits_per_index,
            width: header.width,
            height: header.height,
            depth: header.depth,
            palette_count: header.palette_count,
        }
    }
}

/// Outcome of baking one `.xraw` file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BakeReport {
    pub source: String,
    pub canonical_name: String,
    pub header: HeaderReport,
    pub texture_width: u32,
    pub texture_height: u32,
    pub encode: EncodeStats,
    /// Written PNG, `None` when the texture was empty.
    pub output: Option<String>,
    pub sidecar: Option<String>,
}

/// Outcome of one headless voxelization pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoxelizeReport {
    pub source: String,
    pub canonical_name: String,
    pub volume: [u32; 3],
    pub texture: [u32; 2],
    pub visible_pixels: u64,
    pub capacity: u32,
    pub allocated: u32,
    pub dropped: u32,
    pub free_remaining: u32,
    pub frame: Option<String>,
}

impl VoxelizeReport {
    pub fn new(
        source: &Path,
        texture: &EncodedVoxelTexture,
        capacity: u32,
        stats: VoxelizeStats,
    ) -> Self {
        let volume = texture.volume();
        let dims = texture.dims();
        Self {
            source: source.display().to_string(),
            canonical_name: texture.canonical_name.clone(),
            volume: volume.to_array(),
            texture: [dims.width, dims.height],
            visible_pixels: texture.visible_count(),
            capacity,
            allocated: stats.allocated,
            dropped: stats.dropped,
            free_remaining: stats.free_remaining,
            frame: None,
        }
    }
}

/// Save a report as pretty JSON, creating parent directories.
pub fn save_report<T: serde::Serialize>(path: &Path, report: &T) -> Result<(), BakeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report).map_err(|e| BakeError::Report(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Format a bake result as a markdown summary.
pub fn format_bake_markdown(report: &BakeReport) -> String {
    let h = &report.header;
    let mut out = String::new();
    out.push_str("| Field | Value |\n");
    out.push_str("|-------|-------|\n");
    out.push_str(&format!("| Magic | {} |\n", h.magic));
    out.push_str(&format!("| Color channel type | {} |\n", h.color_channel_type));
    out.push_str(&format!("| Channels | {} |\n", h.num_channels));
    out.push_str(&format!("| Bits per channel | {} |\n", h.bits_per_channel));
    out.push_str(&format!("| Bits per index | {} |\n", h.bits_per_index));
    out.push_str(&format!(
        "| Volume | {}x{}x{} |\n",
        h.width, h.height, h.depth
    ));
    out.push_str(&format!("| Palette entries | {} |\n", h.palette_count));
    out.push_str(&format!(
        "| Texture | {}x{} |\n",
        report.texture_width, report.texture_height
    ));
    out.push_str(&format!(
        "| Voxels (opaque / total) | {} / {} |\n",
        report.encode.opaque_voxels, report.encode.total_voxels
    ));
    if report.encode.unmapped > 0 {
        out.push_str(&format!("| Unmapped indices | {} |\n", report.encode.unmapped));
    }
    out.push_str(&format!(
        "| Output | {} |\n",
        report.output.as_deref().unwrap_or("-")
    ));
    out
}

/// Format a voxelization result as a markdown summary.
pub fn format_voxelize_markdown(report: &VoxelizeReport) -> String {
    let mut out = String::new();
    out.push_str("| Texture | Volume | Visible | Capacity | Allocated | Dropped | Free |\n");
    out.push_str("|---------|--------|---------|----------|-----------|---------|------|\n");
    out.push_str(&format!(
        "| {} | {}x{}x{} | {} | {} | {} | {} | {} |\n",
        report.canonical_name,
        report.volume[0],
        report.volume[1],
        report.volume[2],
        report.visible_pixels,
        report.capacity,
        report.allocated,
        report.dropped,
        report.free_remaining,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelize_core::VolumeDims;

    fn sample_report() -> BakeReport {
        let header = XRawHeader::rgba8(VolumeDims::new(20, 12, 30), 3);
        BakeReport {
            source: "ship.xraw".into(),
            canonical_name: "ship_20-12-30_128-128".into(),
            header: HeaderReport::from(&header),
            texture_width: 128,
            texture_height: 128,
            encode: EncodeStats {
                total_voxels: 7200,
                opaque_voxels: 900,
                unmapped: 0,
            },
            output: Some("out/ship_20-12-30_128-128.png".into()),
            sidecar: None,
        }
    }

    #[test]
    fn test_header_report_fields() {
        let report = sample_report();
        assert_eq!(report.header.magic, "XRAW");
        assert_eq!(report.header.num_channels, 4);
        assert_eq!(report.header.bits_per_index, 8);
        assert_eq!(report.header.palette_count, 3);
    }

    #[test]
    fn test_bake_markdown() {
        let md = format_bake_markdown(&sample_report());
        assert!(md.contains("| Volume | 20x12x30 |"));
        assert!(md.contains("| Texture | 128x128 |"));
        assert!(md.contains("900 / 7200"));
        assert!(!md.contains("Unmapped"));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_string(&sample_report()).expect("serialize");
        assert!(json.contains("\"canonical_name\":\"ship_20-12-30_128-128\""));
        assert!(json.contains("\"sidecar\":null"));
    }
}
