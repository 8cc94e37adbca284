pub mod audit_log;
pub mod config_file;
pub mod error;
pub mod export;
pub mod json_file;
pub mod profile;
pub mod schema;
pub mod store;

pub use audit_log::JsonlAuditLog;
pub use config_file::{load_config, parse_json, parse_toml, to_toml};
pub use error::{Result, StoreError};
pub use export::{EXPORT_VERSION, MemoryExport, export_json, import_json};
pub use json_file::JsonFileBackend;
pub use profile::{ProfileStore, default_base_dir, sanitize_name};
pub use store::Store;
