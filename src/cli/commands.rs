// CLI command implementations
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use flacmeta::{parse_metadata_with, BlockOutcome, MetadataSet, ParseOptions};
use serde_json::{json, Value};
use tracing::info;

use super::output::OutputFormatter;

/// Expand glob patterns; plain paths are passed through unchanged.
pub fn expand_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let before = paths.len();
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern {}", pattern))? {
                let path = entry?;
                if path.is_file() {
                    paths.push(path);
                }
            }
            if paths.len() == before {
                info!("pattern {} matched no files", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    Ok(paths)
}

/// Parse one file, attaching the path to any failure.
fn parse_file(path: &Path, offset: usize, options: &ParseOptions) -> Result<(Vec<u8>, MetadataSet)> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (_, metadata) = parse_metadata_with(&data, offset, options)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok((data, metadata))
}

/// Build the JSON report printed by `read`.
pub fn metadata_report(path: &Path, file_size: usize, metadata: &MetadataSet, include_picture_data: bool) -> Result<Value> {
    let mut value = serde_json::to_value(metadata)?;
    if include_picture_data {
        if let Some(pictures) = value.get_mut("pictures").and_then(Value::as_array_mut) {
            for (slot, picture) in pictures.iter_mut().zip(&metadata.pictures) {
                slot["data"] = Value::String(BASE64.encode(&picture.data));
            }
        }
    }
    Ok(json!({
        "file": path.display().to_string(),
        "file_size": file_size,
        "metadata": value,
    }))
}

/// Read metadata from files
pub fn command_read(
    files: &[String],
    output: Option<&Path>,
    include_picture_data: bool,
    offset: usize,
    keep_going: bool,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    let paths = expand_paths(files)?;
    if paths.is_empty() {
        bail!("no files matched");
    }

    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };

    let mut failures = 0;
    for path in &paths {
        let (data, metadata) = match parse_file(path, offset, options) {
            Ok(parsed) => parsed,
            Err(e) if keep_going => {
                formatter.print_error(&format!("{:#}", e));
                failures += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let report = metadata_report(path, data.len(), &metadata, include_picture_data)?;
        formatter.output_metadata(&report, &mut writer)?;
        if !formatter.is_json() {
            writeln!(
                writer,
                "metadata ends at byte {} of {}",
                metadata.audio_offset,
                data.len()
            )?;
        }
    }
    writer.flush()?;

    if failures > 0 {
        bail!("{} of {} files could not be parsed", failures, paths.len());
    }
    Ok(())
}

/// Detect file format
pub fn command_detect(files: &[String], formatter: &OutputFormatter) -> Result<()> {
    for path in expand_paths(files)? {
        let mut marker = [0u8; 4];
        let is_flac = File::open(&path)
            .and_then(|mut f| io::Read::read_exact(&mut f, &mut marker))
            .map(|_| flacmeta::is_flac(&marker));

        match is_flac {
            Ok(true) => formatter.print_info(&format!("{}: FLAC", path.display())),
            Ok(false) => formatter.print_info(&format!("{}: not FLAC", path.display())),
            Err(e) => formatter.print_error(&format!("{}: {}", path.display(), e)),
        }
    }
    Ok(())
}

/// Export cover art
pub fn command_export_cover(
    file: &Path,
    output_dir: &Path,
    index: Option<usize>,
    offset: usize,
    options: &ParseOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (_, metadata) = parse_file(file, offset, options)?;
    if metadata.pictures.is_empty() {
        bail!("{} has no embedded pictures", file.display());
    }

    let selected: Vec<_> = match index {
        Some(i) => {
            let picture = metadata.pictures.get(i).with_context(|| {
                format!("picture index {} out of range ({} pictures)", i, metadata.pictures.len())
            })?;
            vec![(i, picture)]
        }
        None => metadata.pictures.iter().enumerate().collect(),
    };

    fs::create_dir_all(output_dir).with_context(|| format!("creating {}", output_dir.display()))?;
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cover".to_string());

    for (i, picture) in selected {
        let target = output_dir.join(format!("{}-{}.{}", stem, i, picture.get_extension()));
        fs::write(&target, &picture.data).with_context(|| format!("writing {}", target.display()))?;
        formatter.print_success(&format!(
            "{} ({}, {}x{}, {} bytes)",
            target.display(),
            picture.mime_type,
            picture.width,
            picture.height,
            picture.data.len()
        ));
    }
    Ok(())
}

/// Show file information
pub fn command_info(files: &[String], detailed: bool, offset: usize, options: &ParseOptions) -> Result<()> {
    for path in expand_paths(files)? {
        let stat = fs::metadata(&path).with_context(|| format!("reading {}", path.display()))?;
        let (data, metadata) = parse_file(&path, offset, options)?;

        println!("\n{}", path.display());
        println!("{}", "─".repeat(60));
        println!("Size: {} bytes", stat.len());
        if let Ok(modified) = stat.modified() {
            let modified: DateTime<Utc> = modified.into();
            println!("Modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("Audio frames start at byte {} of {}", metadata.audio_offset, data.len());

        if let Some(stream) = &metadata.stream_info {
            println!(
                "Stream: {} Hz, {} channels, {} bits per sample",
                stream.sample_rate, stream.channels, stream.bits_per_sample
            );
            match stream.duration_secs() {
                Some(secs) => println!("Duration: {:.2} s", secs),
                None => println!("Duration: unknown"),
            }
        }

        println!("Metadata blocks: {}", metadata.blocks.len());
        for block in &metadata.blocks {
            let outcome = match block.outcome {
                BlockOutcome::Decoded => "decoded",
                BlockOutcome::Skipped => "skipped",
                BlockOutcome::Failed => "failed",
            };
            println!(
                "  @{:<8} {:<16} {:>8} bytes  {}",
                block.offset, block.header.block_type, block.header.length, outcome
            );
        }

        if detailed {
            if let Some(stream) = &metadata.stream_info {
                println!("\nDetailed Information:");
                println!("Block size: {}-{} samples", stream.min_block_size, stream.max_block_size);
                println!("Frame size: {}-{} bytes", stream.min_frame_size, stream.max_frame_size);
                println!("MD5: {}", hex::encode(stream.md5_signature));
            }
            if let Some(table) = &metadata.seek_table {
                println!(
                    "Seek points: {} ({} placeholders)",
                    table.len(),
                    table.len() - table.real_points().count()
                );
            }
            if let Some(comment) = &metadata.vorbis_comment {
                println!("Vendor: {}", comment.vendor_string);
                for (key, value) in &comment.comments {
                    println!("  {}={}", key, value);
                }
            }
            for picture in &metadata.pictures {
                let kind = picture
                    .kind()
                    .map(|k| k.label().to_string())
                    .unwrap_or_else(|| format!("type {}", picture.picture_type));
                println!(
                    "Picture: {} {} {}x{} ({} bytes)",
                    kind,
                    picture.mime_type,
                    picture.width,
                    picture.height,
                    picture.data.len()
                );
            }
        }

        for warning in &metadata.warnings {
            println!("warning: {}", warning);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::OutputFormat;
    use flacmeta::{BlockHeader, BlockType, Picture, FLAC_SIGNATURE};

    fn flac_with_picture() -> Vec<u8> {
        let picture = Picture {
            picture_type: 3,
            mime_type: "image/jpeg".to_string(),
            description: String::new(),
            width: 1,
            height: 1,
            depth: 24,
            colors: 0,
            data: vec![0xFF, 0xD8, 0xFF],
        }
        .to_bytes();
        let mut bytes = FLAC_SIGNATURE.to_vec();
        let header = BlockHeader {
            is_last: true,
            block_type: BlockType::Picture,
            length: picture.len() as u32,
        };
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&picture);
        bytes
    }

    #[test]
    fn report_embeds_picture_data_on_request() {
        let data = flac_with_picture();
        let (_, metadata) = flacmeta::parse_metadata(&data, 0).unwrap();

        let report = metadata_report(Path::new("a.flac"), data.len(), &metadata, true).unwrap();
        assert_eq!(report["metadata"]["pictures"][0]["data"], "/9j/");
        assert_eq!(report["metadata"]["pictures"][0]["data_length"], 3);

        let report = metadata_report(Path::new("a.flac"), data.len(), &metadata, false).unwrap();
        assert!(report["metadata"]["pictures"][0].get("data").is_none());
    }

    #[test]
    fn exports_covers_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.flac");
        fs::write(&input, flac_with_picture()).unwrap();

        let out = dir.path().join("covers");
        let formatter = OutputFormatter::new(OutputFormat::Pretty, true);
        command_export_cover(&input, &out, None, 0, &ParseOptions::default(), &formatter).unwrap();
        assert_eq!(fs::read(out.join("song-0.jpg")).unwrap(), vec![0xFF, 0xD8, 0xFF]);

        assert!(command_export_cover(&input, &out, Some(3), 0, &ParseOptions::default(), &formatter).is_err());
    }

    #[test]
    fn export_honours_marker_offset() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tagged.flac");
        let mut data = vec![0u8; 16];
        data.extend(flac_with_picture());
        fs::write(&input, &data).unwrap();

        let out = dir.path().join("covers");
        let formatter = OutputFormatter::new(OutputFormat::Pretty, true);
        let options = ParseOptions::default();
        assert!(command_export_cover(&input, &out, None, 0, &options, &formatter).is_err());
        command_export_cover(&input, &out, None, 16, &options, &formatter).unwrap();
        assert_eq!(fs::read(out.join("tagged-0.jpg")).unwrap(), vec![0xFF, 0xD8, 0xFF]);

        let files = [input.to_string_lossy().into_owned()];
        assert!(command_info(&files, false, 0, &options).is_err());
        command_info(&files, true, 16, &options).unwrap();
    }

    #[test]
    fn plain_paths_pass_through_glob_expansion() {
        let paths = expand_paths(&["missing.flac".to_string()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("missing.flac")]);
    }
}
