//! Run manifest written next to exported chunks

use std::path::Path;

use serde_json::json;

use super::{RenderSettings, TileSummary};
use crate::core::Result;
use crate::tile::RunReport;

/// Record the region, effective settings, chunk layout and the outcome of
/// every tile as `manifest.json` inside `dir`
pub fn write_manifest(
    dir: &Path,
    region: &str,
    settings: &RenderSettings,
    report: &RunReport<TileSummary>,
    chunk_files: usize,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let manifest = json!({
        "region": region,
        "version": 1,
        "settings": settings,
        "layout": settings.layout,
        "chunk_files": chunk_files,
        "tiles": report.completed.iter().map(|(_, summary)| summary).collect::<Vec<_>>(),
        "failed": report.failed.iter().map(|(index, error)| {
            json!({"row": index.row, "col": index.col, "error": error.to_string()})
        }).collect::<Vec<_>>(),
    });

    let path = dir.join("manifest.json");
    std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::generation::{RegionBounds, RenderConfig};
    use crate::math::GridExtent;
    use crate::tile::TileIndex;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_contents() {
        let temp_dir = TempDir::new().unwrap();
        let settings = RenderConfig::default().resolve(&RegionBounds {
            name: "r".into(),
            rows: 32,
            cols: 32,
            pixel_size: 6.0,
            elev_max: 100.0,
        });
        let report = RunReport {
            completed: vec![(
                TileIndex::new(0, 0),
                TileSummary {
                    index: TileIndex::new(0, 0),
                    base: GridExtent::new(0, 0, 32, 32),
                    columns: 1024,
                    water_cells: 10,
                    deepest: 3,
                    elapsed_ms: 5,
                },
            )],
            failed: vec![(TileIndex::new(0, 1), Error::Scheduler("boom".into()))],
        };

        write_manifest(temp_dir.path(), "r", &settings, &report, 9).unwrap();

        let text = std::fs::read_to_string(temp_dir.path().join("manifest.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["region"], "r");
        assert_eq!(value["chunk_files"], 9);
        assert_eq!(value["layout"]["height"], 128);
        assert_eq!(value["tiles"][0]["columns"], 1024);
        assert_eq!(value["failed"][0]["col"], 1);
        assert!(value["failed"][0]["error"].as_str().unwrap().contains("boom"));
    }
}
