use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

use crate::registry::{QuantizerType, TypedQuantizer};
use crate::typing::VectorValueType;

pub const QUANTIZER_CONFIG_NAME: &str = "quantizer_config.yaml";
pub const QUANTIZER_FILE_NAME: &str = "quantizer.bin";

/// Sidecar config carrying what the binary codebook file cannot: which kind
/// of quantizer it is and which scalar type it was built over.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct QuantizerConfig {
    pub quantizer_type: QuantizerType,
    pub value_type: VectorValueType,
}

pub struct QuantizerWriter {
    base_directory: String,
}

impl QuantizerWriter {
    pub fn new(base_directory: String) -> Self {
        Self { base_directory }
    }

    /// Writes the codebook binary and its sidecar config into the base
    /// directory, replacing any previous pair.
    pub fn write(&self, quantizer: &TypedQuantizer) -> Result<()> {
        let config_path = Path::new(&self.base_directory).join(QUANTIZER_CONFIG_NAME);
        if config_path.exists() {
            std::fs::remove_file(&config_path)?;
        }

        let quantizer_path = Path::new(&self.base_directory).join(QUANTIZER_FILE_NAME);
        if quantizer_path.exists() {
            std::fs::remove_file(&quantizer_path)?;
        }

        let mut quantizer_file = File::create(&quantizer_path)?;
        let mut writer = BufWriter::new(&mut quantizer_file);
        quantizer.save(&mut writer)?;
        writer.flush()?;

        let config = QuantizerConfig {
            quantizer_type: quantizer.quantizer_type(),
            value_type: quantizer.value_type(),
        };
        let mut config_file = File::create(&config_path)?;
        config_file.write_all(serde_yaml::to_string(&config)?.as_bytes())?;

        info!(
            "Wrote quantizer to {}: {:?}",
            self.base_directory, config
        );
        Ok(())
    }
}
