//! `generate`: render source features into a tile archive (§6).
//!
//! Source-format parsing (OSM PBF, Natural Earth, Parquet, Shapefile) is out
//! of scope for the pipeline crate, so this subcommand reads a small
//! NDJSON point format instead: one `{"lon":..,"lat":..,...}` object per
//! line, with every other key becoming a string/number/bool attribute. This
//! is enough to exercise the full pipeline end to end from the CLI without
//! fabricating a source-format parser the pipeline itself doesn't own.

use anyhow::{bail, Context, Result};
use geo::{Geometry, Point};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tilekiln_pipeline::{
	ArchiveMetadata, ArchiveWriter, AttributeValue, DirectoryArchiveWriter, EmitOptions, FeatureEmitter, GeometryRequest, MbtilesArchiveWriter, NamedSource, Pipeline,
	PipelineConfig, Profile, SourceFeature, StreamingArchiveWriter, TileOrder,
};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// NDJSON source files; each line is a `{"lon":..,"lat":..}` point feature
	#[arg(required = true)]
	input: Vec<PathBuf>,

	/// archive to write: `*.mbtiles`, a directory (per-file `{z}/{x}/{y}.pbf`),
	/// `*.ndjson`/`*.jsonl`, or `-` for streaming NDJSON on stdout
	#[arg(long)]
	output: PathBuf,

	/// output layer every feature is emitted into
	#[arg(long, default_value = "features")]
	layer: String,

	/// worker threads for rendering and tile encoding (default: one per CPU)
	#[arg(long, value_name = "n")]
	threads: Option<usize>,

	/// minimum zoom level to render
	#[arg(long, default_value_t = 0)]
	minzoom: u8,

	/// maximum zoom level to render
	#[arg(long, default_value_t = 14)]
	maxzoom: u8,

	/// restrict generation to `minLon,minLat,maxLon,maxLat`, or `world`
	#[arg(long, value_name = "minLon,minLat,maxLon,maxLat|world")]
	bounds: Option<String>,

	/// tiles at or above this encoded size are logged as a warning
	#[arg(long, value_name = "n")]
	tile_warning_size_bytes: Option<u64>,

	/// drop tiles whose single layer is a full-tile fill with no attribute variation
	#[arg(long)]
	skip_filled_tiles: bool,

	/// compression applied to each tile payload
	#[arg(long, value_enum)]
	tile_compression: Option<tilekiln_core::TileCompression>,

	/// directory spill chunks and scratch files are created in
	#[arg(long, value_name = "path")]
	tmpdir: Option<PathBuf>,

	/// soft cap on total process memory; derives the sorter's spill-chunk size
	#[arg(long, value_name = "n")]
	max_memory_bytes: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let bounds = parse_bounds(arguments.bounds.as_deref())?;
	let config = build_config(arguments, bounds)?;

	let sources = arguments
		.input
		.iter()
		.map(|path| -> Result<NamedSource> {
			let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("source").to_string();
			let file = File::open(path).with_context(|| format!("opening source file {path:?}"))?;
			Ok(NamedSource { name, features: Box::new(NdjsonPoints::new(BufReader::new(file))) })
		})
		.collect::<Result<Vec<_>>>()?;

	let profile: Arc<dyn Profile> = Arc::new(PassthroughProfile { layer: arguments.layer.clone(), min_zoom: arguments.minzoom, max_zoom: arguments.maxzoom });

	let metadata = ArchiveMetadata {
		name: arguments.layer.clone(),
		description: String::new(),
		attribution: String::new(),
		version: "1".to_string(),
		is_overlay: false,
		zoom: config.zoom,
		bounds,
	};

	let pipeline = Pipeline::new(config, profile);
	let result = run_with_writer(&pipeline, sources, &arguments.output, metadata).await;

	match result {
		Ok(()) => Ok(()),
		Err(err) => {
			log::error!("generate failed: {err}");
			std::process::exit(err.exit_code());
		}
	}
}

async fn run_with_writer(pipeline: &Pipeline, sources: Vec<NamedSource>, output: &PathBuf, metadata: ArchiveMetadata) -> Result<(), tilekiln_pipeline::PipelineError> {
	// Archive format is chosen from the output path's shape, the way
	// `tilekiln_container`'s readers pick a format from a file extension.
	let order = TileOrder::Tms;
	if output.to_str() == Some("-") {
		return run_pipeline(pipeline, sources, StreamingArchiveWriter::new(BufWriter::new(io::stdout()), order), metadata).await;
	}

	let result = match output.extension().and_then(|ext| ext.to_str()) {
		Some("mbtiles") => {
			let writer = MbtilesArchiveWriter::create(output, order).map_err(to_pipeline_error)?;
			run_pipeline(pipeline, sources, writer, metadata).await
		}
		Some("ndjson" | "jsonl") => {
			let file = File::create(output).map_err(|source| tilekiln_pipeline::PipelineError::Io { during: "creating output file", path: Some(output.clone()), source })?;
			run_pipeline(pipeline, sources, StreamingArchiveWriter::new(BufWriter::new(file), order), metadata).await
		}
		_ => {
			let writer = DirectoryArchiveWriter::create(output.clone(), order).map_err(to_pipeline_error)?;
			run_pipeline(pipeline, sources, writer, metadata).await
		}
	};

	// §5's resource policy: a failed or cancelled run leaves no partial
	// archive on disk. The writer itself has no rollback hook (§4.7), so the
	// CLI that created the output path removes it on any error here.
	if result.is_err() {
		delete_partial_output(output);
	}
	result
}

/// Best-effort removal of whatever `output` names, logged but not fatal:
/// the pipeline error itself is always what gets surfaced to the caller.
fn delete_partial_output(output: &PathBuf) {
	let removal = if output.is_dir() { fs::remove_dir_all(output) } else { fs::remove_file(output) };
	if let Err(err) = removal {
		if err.kind() != io::ErrorKind::NotFound {
			log::warn!("failed to remove partial output {}: {err}", output.display());
		}
	}
}

async fn run_pipeline<W: ArchiveWriter + Send + 'static>(pipeline: &Pipeline, sources: Vec<NamedSource>, writer: W, metadata: ArchiveMetadata) -> Result<(), tilekiln_pipeline::PipelineError> {
	pipeline.run(sources, writer, metadata).await
}

fn to_pipeline_error(err: anyhow::Error) -> tilekiln_pipeline::PipelineError {
	tilekiln_pipeline::PipelineError::Configuration(err.to_string())
}

fn build_config(arguments: &Subcommand, bounds: Option<[f64; 4]>) -> Result<PipelineConfig> {
	bail_if_invalid_zoom(arguments)?;
	let tmp_dir = arguments.tmpdir.clone().unwrap_or_else(std::env::temp_dir);
	let mut config = PipelineConfig::new(arguments.minzoom, arguments.maxzoom, tmp_dir);
	config.bounds = bounds;
	if let Some(n) = arguments.threads {
		config.concurrency = tilekiln_core::ConcurrencyLimits::new(n, n, n);
	}
	if let Some(warn) = arguments.tile_warning_size_bytes {
		config.tile_warning_size_bytes = warn;
	}
	config.skip_filled_tiles = arguments.skip_filled_tiles;
	if let Some(compression) = arguments.tile_compression {
		config.tile_compression = compression;
	}
	config.max_memory_bytes = arguments.max_memory_bytes;
	Ok(config)
}

fn bail_if_invalid_zoom(arguments: &Subcommand) -> Result<()> {
	if arguments.minzoom > arguments.maxzoom {
		bail!("--minzoom ({}) must not exceed --maxzoom ({})", arguments.minzoom, arguments.maxzoom);
	}
	if arguments.maxzoom > tilekiln_pipeline::MAX_ZOOM {
		bail!("--maxzoom ({}) exceeds the maximum supported zoom {}", arguments.maxzoom, tilekiln_pipeline::MAX_ZOOM);
	}
	Ok(())
}

fn parse_bounds(bounds: Option<&str>) -> Result<Option<[f64; 4]>> {
	match bounds {
		None => Ok(None),
		Some("world") => Ok(Some([-180.0, -85.051_128_78, 180.0, 85.051_128_78])),
		Some(raw) => {
			let values: Vec<f64> = raw.split(',').map(str::trim).map(str::parse).collect::<Result<_, _>>().with_context(|| format!("parsing --bounds {raw:?}"))?;
			let [min_lon, min_lat, max_lon, max_lat]: [f64; 4] = values.try_into().map_err(|_| anyhow::anyhow!("--bounds must have exactly 4 numbers, got {raw:?}"))?;
			Ok(Some([min_lon, min_lat, max_lon, max_lat]))
		}
	}
}

/// Emits every source feature, unmodified, into a single configured layer
/// across the whole requested zoom range.
struct PassthroughProfile {
	layer: String,
	min_zoom: u8,
	max_zoom: u8,
}

impl Profile for PassthroughProfile {
	fn process_feature(&self, source: &SourceFeature, emitter: &mut FeatureEmitter) -> Result<()> {
		let options = EmitOptions { geometry_kind: GeometryRequest::AsIs, ..EmitOptions::new(self.layer.clone(), self.min_zoom, self.max_zoom) };
		let mut builder = emitter.emit(source.geometry.clone(), options);
		for (key, value) in &source.attributes {
			builder = builder.attr(key.clone(), value.clone());
		}
		Ok(())
	}

	fn name(&self) -> &str {
		"passthrough"
	}
}

/// Reads NDJSON point features: `{"lon": f64, "lat": f64, ...attrs}` per line.
struct NdjsonPoints<R> {
	lines: io::Lines<R>,
}

impl<R: BufRead> NdjsonPoints<R> {
	fn new(reader: R) -> Self {
		Self { lines: reader.lines() }
	}
}

impl<R: BufRead> Iterator for NdjsonPoints<R> {
	type Item = Result<SourceFeature>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let line = match self.lines.next()? {
				Ok(line) => line,
				Err(err) => return Some(Err(err.into())),
			};
			if line.trim().is_empty() {
				continue;
			}
			return Some(parse_point_line(&line));
		}
	}
}

fn parse_point_line(line: &str) -> Result<SourceFeature> {
	let object = tilekiln_core::json::JsonObject::parse_str(line).with_context(|| format!("parsing NDJSON line {line:?}"))?;
	let lon = object.get("lon").and_then(tilekiln_core::json::JsonValue::as_f64).context("missing numeric \"lon\"")?;
	let lat = object.get("lat").and_then(tilekiln_core::json::JsonValue::as_f64).context("missing numeric \"lat\"")?;

	let mut attributes = BTreeMap::new();
	for (key, value) in object.iter() {
		if key == "lon" || key == "lat" {
			continue;
		}
		if let Some(attr) = json_value_to_attribute(value) {
			attributes.insert(key.to_string(), attr);
		}
	}

	Ok(SourceFeature { geometry: Geometry::Point(Point::new(lon, lat)), attributes, source_name: String::new() })
}

fn json_value_to_attribute(value: &tilekiln_core::json::JsonValue) -> Option<AttributeValue> {
	match value {
		tilekiln_core::json::JsonValue::String(s) => Some(AttributeValue::String(s.clone())),
		tilekiln_core::json::JsonValue::Number(n) => Some(AttributeValue::Double(*n)),
		tilekiln_core::json::JsonValue::Boolean(b) => Some(AttributeValue::Bool(*b)),
		_ => None,
	}
}
