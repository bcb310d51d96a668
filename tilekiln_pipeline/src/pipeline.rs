//! `Pipeline` (§4.8): wires ingestion, sort-key encoding, external sort,
//! tile grouping, parallel encoding, and ordered archive writing into one
//! run.
//!
//! Ingestion is OS-thread based (source readers and feature emitters run on
//! `std::thread`, mirroring [`crate::external_merge_sort`]'s own spill
//! thread); tile encoding and writing overlap via `tokio` tasks, the same
//! idiom [`crate::tile_encoder_pool`] uses for per-batch concurrency. A
//! bounded window of in-flight encoder tasks, drained in submission order,
//! gives the writer the "encoder may finish out of order, writer sees
//! submission order" guarantee from §5 without an explicit completion-future
//! type of its own.

use crate::archive_writer::{ArchiveMetadata, ArchiveWriter};
use crate::cancellation::Cancellation;
use crate::error::PipelineError;
use crate::external_merge_sort::ExternalMergeSort;
use crate::feature_group::FeatureGroup;
use crate::layer_registry::LayerRegistry;
use crate::profile::{FeatureEmitter, Profile, SourceFeature};
use crate::rendered_feature::RenderedFeature;
use crate::stats::Stats;
use crate::tile_encoder_pool::{EncodedTile, TileEncoderPool, MAX_FEATURES_PER_BATCH, MAX_TILES_PER_BATCH};
use crate::writer_ordered_sink::WriterOrderedSink;
use crate::PipelineConfig;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

/// One named input: a source identifier (for `Profile::cares_about_source`
/// and error logging) plus its feature iterator. Parsing OSM PBF / Natural
/// Earth / Parquet / Shapefile into this shape is out of scope (§1).
pub struct NamedSource {
	pub name: String,
	pub features: Box<dyn Iterator<Item = Result<SourceFeature>> + Send>,
}

/// Phases of a run, in the order §4.8 names them. Logged at each
/// transition; `Failed` is reachable from any of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
	Init,
	ReadSources,
	Sort,
	EmitTiles,
	Finish,
	Done,
}

impl PipelineState {
	fn label(self) -> &'static str {
		match self {
			PipelineState::Init => "INIT",
			PipelineState::ReadSources => "READ_SOURCES",
			PipelineState::Sort => "SORT",
			PipelineState::EmitTiles => "EMIT_TILES",
			PipelineState::Finish => "FINISH",
			PipelineState::Done => "DONE",
		}
	}
}

/// Upper bound on source features buffered between the reader threads and
/// the emitter threads before a reader blocks.
const FEATURE_QUEUE_CAPACITY: usize = 4096;
/// Encoder batches allowed in flight at once; bounds how far ahead of the
/// writer the encoder pool is allowed to run.
const MAX_BATCHES_IN_FLIGHT: usize = 4;

/// Orchestrates one archive build from a set of sources to a finished
/// [`ArchiveWriter`].
pub struct Pipeline {
	config: PipelineConfig,
	profile: Arc<dyn Profile>,
	registry: Arc<LayerRegistry>,
	stats: Stats,
	cancellation: Cancellation,
}

impl Pipeline {
	#[must_use]
	pub fn new(config: PipelineConfig, profile: Arc<dyn Profile>) -> Self {
		Self { config, profile, registry: Arc::new(LayerRegistry::new()), stats: Stats::new(), cancellation: Cancellation::new() }
	}

	#[must_use]
	pub fn cancellation(&self) -> Cancellation {
		self.cancellation.clone()
	}

	#[must_use]
	pub fn stats(&self) -> Stats {
		self.stats.clone()
	}

	/// Runs a pipeline to completion: reads every source, sorts, groups by
	/// tile, encodes, and writes `writer`. On any fatal error the archive
	/// writer's own partial output is left for the caller to delete — a
	/// `writer` that creates output atomically (as
	/// [`crate::archive_writer::MbtilesArchiveWriter`] and friends are
	/// expected to) never exposes that partial state.
	///
	/// # Errors
	/// Returns [`PipelineError::Cancelled`] if `self.cancellation()` was
	/// triggered concurrently, otherwise the first fatal error encountered.
	pub async fn run<W>(&self, sources: Vec<NamedSource>, writer: W, metadata: ArchiveMetadata) -> Result<(), PipelineError>
	where
		W: ArchiveWriter + Send + 'static,
	{
		self.transition(PipelineState::Init);
		let result = self.run_inner(sources, writer, metadata).await;
		match result {
			Ok(()) => {
				self.transition(PipelineState::Done);
				Ok(())
			}
			Err(err) => {
				log::error!("pipeline failed: {err:#}");
				Err(self.classify(err))
			}
		}
	}

	async fn run_inner<W>(&self, sources: Vec<NamedSource>, writer: W, metadata: ArchiveMetadata) -> Result<()>
	where
		W: ArchiveWriter + Send + 'static,
	{
		self.transition(PipelineState::ReadSources);
		let sorter = self.ingest(sources)?;

		self.transition(PipelineState::Sort);
		let merged = sorter.iter().context("starting merge over spilled chunks")?;

		self.transition(PipelineState::EmitTiles);
		let mut sink = self.emit_tiles(merged, writer, &metadata).await?;

		self.transition(PipelineState::Finish);
		sink.finish(&metadata).context("finishing archive")?;
		Ok(())
	}

	fn transition(&self, state: PipelineState) {
		log::info!("pipeline: {}", state.label());
	}

	fn classify(&self, err: anyhow::Error) -> PipelineError {
		if self.cancellation.is_cancelled() {
			return PipelineError::Cancelled;
		}
		PipelineError::Io { during: "pipeline", path: None, source: std::io::Error::other(err.to_string()) }
	}

	/// Reads every source to completion, rendering and sort-key-encoding
	/// each feature along the way, and returns the finished sorter ready to
	/// be drained in order.
	fn ingest(&self, sources: Vec<NamedSource>) -> Result<ExternalMergeSort<RenderedFeature>> {
		let mut sorter = ExternalMergeSort::new(self.config.tmp_dir.clone(), self.config.effective_chunk_max_bytes(), self.stats.clone())?;

		let (feature_tx, feature_rx) = mpsc::sync_channel::<(Arc<str>, SourceFeature)>(FEATURE_QUEUE_CAPACITY);
		let feature_rx = Arc::new(Mutex::new(feature_rx));

		let reader_handles: Vec<_> = sources
			.into_iter()
			.map(|source| {
				let tx = feature_tx.clone();
				let cancellation = self.cancellation.clone();
				let name: Arc<str> = Arc::from(source.name.as_str());
				thread::spawn(move || {
					for item in source.features {
						if cancellation.is_cancelled() {
							break;
						}
						match item {
							Ok(feature) => {
								if tx.send((Arc::clone(&name), feature)).is_err() {
									break;
								}
							}
							Err(err) => log::warn!("input error reading source {name}: {err:#}"),
						}
					}
				})
			})
			.collect();
		drop(feature_tx);

		let (rendered_tx, rendered_rx) = mpsc::channel::<RenderedFeature>();
		let emitter_count = self.config.concurrency.cpu_bound.max(1);
		let emitter_handles: Vec<_> = (0..emitter_count)
			.map(|_| {
				let feature_rx = Arc::clone(&feature_rx);
				let rendered_tx = rendered_tx.clone();
				let profile = Arc::clone(&self.profile);
				let registry = Arc::clone(&self.registry);
				let cancellation = self.cancellation.clone();
				let order = self.config.order;
				let stats = self.stats.clone();
				thread::spawn(move || Self::emit_worker(&feature_rx, &rendered_tx, profile.as_ref(), &registry, order, &cancellation, &stats))
			})
			.collect();
		drop(rendered_tx);

		for record in &rendered_rx {
			if self.cancellation.is_cancelled() {
				anyhow::bail!("pipeline cancelled while ingesting sources");
			}
			sorter.append(&record)?;
		}

		for handle in reader_handles {
			handle.join().map_err(|_| anyhow::anyhow!("source reader thread panicked"))?;
		}
		for handle in emitter_handles {
			handle.join().map_err(|_| anyhow::anyhow!("feature emitter thread panicked"))?;
		}

		sorter.finish()?;
		Ok(sorter)
	}

	/// One feature-emitter thread's body (§4.8 `R feature-emitter threads`):
	/// pulls source features off the shared queue, runs them through the
	/// profile, and renders every emission into tile-covering records.
	fn emit_worker(
		feature_rx: &Mutex<mpsc::Receiver<(Arc<str>, SourceFeature)>>,
		rendered_tx: &mpsc::Sender<RenderedFeature>,
		profile: &dyn Profile,
		registry: &LayerRegistry,
		order: crate::sort_key::TileOrder,
		cancellation: &Cancellation,
		stats: &Stats,
	) {
		let renderer = crate::feature_renderer::FeatureRenderer::new(registry, order);
		loop {
			if cancellation.is_cancelled() {
				return;
			}
			let next = { feature_rx.lock().expect("feature queue mutex poisoned").recv() };
			let Ok((source_name, source_feature)) = next else {
				return;
			};
			if !profile.cares_about_source(&source_name) {
				continue;
			}
			stats.add_features_read(1);
			let mut emitter = FeatureEmitter::new();
			if let Err(err) = profile.process_feature(&source_feature, &mut emitter) {
				log::warn!("processFeature failed for source {source_name}: {err:#}");
				stats.add_features_skipped(1);
				continue;
			}
			for (index, emission) in emitter.into_emissions().into_iter().enumerate() {
				let feature_order = u8::try_from(index).unwrap_or(u8::MAX);
				match renderer.render(&emission, feature_order) {
					Ok(rendered) => {
						for record in rendered {
							if rendered_tx.send(record).is_err() {
								return;
							}
						}
					}
					Err(err) => log::warn!("rendering emission from source {source_name} failed: {err:#}"),
				}
			}
		}
	}

	/// Groups the merged feature stream into tiles, batches them, and runs
	/// encoding and writing concurrently, returning the sink once every
	/// batch has been handed to it (still open; `finish` is the caller's
	/// responsibility).
	async fn emit_tiles<I, W>(&self, merged: I, writer: W, metadata: &ArchiveMetadata) -> Result<WriterOrderedSink<W>>
	where
		I: Iterator<Item = Result<RenderedFeature>>,
		W: ArchiveWriter + Send + 'static,
	{
		let mut groups = FeatureGroup::new(merged, self.config.order);
		let pool = Arc::new(TileEncoderPool::new(self.config.clone(), self.stats.clone()));
		let concurrency = self.config.concurrency.cpu_bound.max(1);

		let mut sink = WriterOrderedSink::new(writer, self.stats.clone());
		sink.initialize(metadata)?;

		let mut in_flight: VecDeque<tokio::task::JoinHandle<Result<Vec<EncodedTile>>>> = VecDeque::new();
		let mut batch = Vec::new();
		let mut batch_feature_count = 0usize;

		loop {
			if self.cancellation.is_cancelled() {
				anyhow::bail!("pipeline cancelled while emitting tiles");
			}
			let next = groups.next_tile(self.profile.as_ref(), &self.registry)?;
			let exhausted = next.is_none();
			if let Some(group) = next {
				batch_feature_count += group.layers.iter().map(|layer| layer.features.len()).sum::<usize>();
				batch.push(group);
			}

			let batch_full = batch.len() >= MAX_TILES_PER_BATCH || batch_feature_count >= MAX_FEATURES_PER_BATCH;
			if (batch_full || exhausted) && !batch.is_empty() {
				let dispatch = std::mem::take(&mut batch);
				batch_feature_count = 0;
				if in_flight.len() >= MAX_BATCHES_IN_FLIGHT {
					Self::drain_one(&mut in_flight, &mut sink).await?;
				}
				let pool = Arc::clone(&pool);
				in_flight.push_back(tokio::spawn(async move { pool.encode_batch(dispatch, concurrency).await }));
			}
			if exhausted {
				break;
			}
		}

		while !in_flight.is_empty() {
			Self::drain_one(&mut in_flight, &mut sink).await?;
		}

		Ok(sink)
	}

	async fn drain_one<W: ArchiveWriter>(in_flight: &mut VecDeque<tokio::task::JoinHandle<Result<Vec<EncodedTile>>>>, sink: &mut WriterOrderedSink<W>) -> Result<()> {
		let handle = in_flight.pop_front().expect("drain_one called with an empty queue");
		let tiles = handle.await.context("tile encoder task panicked")??;
		sink.write_batch(tiles)
	}
}
