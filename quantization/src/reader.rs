use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Error, Result};
use log::info;

use crate::registry::TypedQuantizer;
use crate::writer::{QuantizerConfig, QUANTIZER_CONFIG_NAME, QUANTIZER_FILE_NAME};

pub struct QuantizerReader {
    base_directory: String,
}

impl QuantizerReader {
    pub fn new(base_directory: String) -> Self {
        Self { base_directory }
    }

    /// Reads the sidecar config to learn the quantizer kind and scalar type,
    /// then loads the codebook binary as that variant.
    pub fn read(&self) -> Result<TypedQuantizer> {
        let config_path = Path::new(&self.base_directory).join(QUANTIZER_CONFIG_NAME);
        if !config_path.is_file() {
            return Err(Error::msg("Quantizer config file does not exist"));
        }

        let config_buffer = std::fs::read(config_path)?;
        let config: QuantizerConfig = serde_yaml::from_slice(&config_buffer)?;

        let quantizer_path = Path::new(&self.base_directory).join(QUANTIZER_FILE_NAME);
        let quantizer_file = File::open(quantizer_path)?;
        let mut reader = BufReader::new(quantizer_file);
        let quantizer =
            TypedQuantizer::load(&mut reader, config.quantizer_type, config.value_type)?;

        info!(
            "Read quantizer from {}: {:?}",
            self.base_directory, config
        );
        Ok(quantizer)
    }
}
