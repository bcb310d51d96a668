//! TileKiln feature-to-tiles pipeline.
//!
//! Three phases, same order every run: feature emission + sort-key encoding
//! ([`sort_key`], [`rendered_feature`], [`geometry_codec`], [`profile`],
//! [`feature_renderer`]), external k-way sort + tile grouping
//! ([`external_merge_sort`], [`feature_group`], [`layer_registry`]), and
//! parallel tile encoding + ordered archive writing ([`tile_encoder_pool`],
//! [`archive_writer`]). [`pipeline`] wires the three together; [`config`],
//! [`stats`], and [`error`] are the ambient configuration, metrics, and
//! error-kind surface shared across all of them.

mod archive_writer;
mod cancellation;
mod clip;
mod config;
mod error;
mod external_merge_sort;
mod feature_group;
mod feature_renderer;
mod geometry_codec;
mod layer_registry;
mod pipeline;
mod profile;
mod rendered_feature;
mod sort_key;
mod stats;
mod tile_encoder_pool;
mod writer_ordered_sink;

pub use archive_writer::{ArchiveMetadata, ArchiveWriter, DirectoryArchiveWriter, MbtilesArchiveWriter, StreamingArchiveWriter};
pub use cancellation::Cancellation;
pub use config::{PipelineConfig, ZoomRange};
pub use error::{ErrorContext, PipelineError};
pub use external_merge_sort::ExternalMergeSort;
pub use feature_group::FeatureGroup;
pub use feature_renderer::FeatureRenderer;
pub use geometry_codec::{GeometryKind, Part, TilePoint};
pub use layer_registry::LayerRegistry;
pub use pipeline::{NamedSource, Pipeline};
pub use profile::{Attr, EmitOptions, Emission, FeatureEmitter, GeometryRequest, LayerFeatures, Profile, SourceFeature};
pub use rendered_feature::{AttributeValue, RenderedFeature};
pub use sort_key::{pack as pack_sort_key, TileOrder, MAX_ZOOM};
pub use stats::Stats;
pub use tile_encoder_pool::{EncodedTile, TileEncoderPool, MAX_FEATURES_PER_BATCH, MAX_TILES_PER_BATCH};
pub use writer_ordered_sink::WriterOrderedSink;
