//! Options for the parquet helpers.

use parquet::file::properties::WriterProperties;

/// Default number of rows per batch when reading parquet files.
pub const DEFAULT_BATCH_SIZE: usize = 64 * 1024;

/// Reader and writer settings used by [`crate::io`].
#[derive(Debug, Clone)]
pub struct ParquetOptions {
    /// Rows per record batch produced by the reader.
    pub batch_size: usize,
    /// Writer properties; `None` uses the parquet defaults.
    pub writer_properties: Option<WriterProperties>,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            writer_properties: None,
        }
    }
}

impl ParquetOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_writer_properties(mut self, properties: WriterProperties) -> Self {
        self.writer_properties = Some(properties);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_large_batches_and_parquet_writer_defaults() {
        let options = ParquetOptions::default();
        assert_eq!(options.batch_size, 64 * 1024);
        assert!(options.writer_properties.is_none());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let options = ParquetOptions::default()
            .with_batch_size(16)
            .with_writer_properties(WriterProperties::builder().set_max_row_group_size(8).build());
        assert_eq!(options.batch_size, 16);
        assert_eq!(
            options.writer_properties.unwrap().max_row_group_size(),
            8
        );
    }
}
