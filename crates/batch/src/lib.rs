//! BatchProcessor (C7): scheduled ingestion of external CRM/ERP sources
//! into the indexing pipeline.

pub mod connector;
pub mod processor;

pub use connector::{DataSourceConnector, StaticConnector};
pub use processor::{BatchProcessor, BatchProcessorConfig};
