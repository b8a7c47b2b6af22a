mod package;
mod record;
mod resource;

pub use package::Package;
pub use record::{ChangeRecord, ConfigKey, RecordDiff, ShaderKey};
pub use resource::{normalize_data_path, normalize_token, validate_data_path, ResourceId};

#[cfg(test)]
mod tests;
