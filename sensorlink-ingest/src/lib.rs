pub mod api;
pub mod collector;
pub mod config;
pub mod observer;
pub mod pipeline;
pub mod source;
pub mod storage;

pub use collector::run_collector;
pub use config::{Config, ServerConfig, SourceConfig, StorageConfig};
pub use observer::{ReadingEvent, ReadingObserver, TracingObserver};
pub use pipeline::{IngestError, IngestPipeline, Ingested, LinkStats};
pub use source::mock::MockSource;
pub use source::serial::SerialSource;
pub use source::tcp::TcpSource;
pub use source::{ByteSource, LinkEvent, LinkId};
pub use storage::memory::MemoryStorage;
pub use storage::sqlite::SqliteStorage;
pub use storage::{NewReading, NewSensor, SensorStorage, StorageStats};
