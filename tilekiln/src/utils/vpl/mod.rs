mod parser;
mod vpl_node;
mod vpl_pipeline;

pub use parser::parse_vpl;
pub use vpl_node::VPLNode;
pub use vpl_pipeline::VPLPipeline;
