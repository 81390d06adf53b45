use thiserror::Error;

/// Errors surfaced by the quantization engine. Nothing is swallowed: every
/// failure propagates to the caller as one of these kinds.
#[derive(Debug, Error)]
pub enum QuantizationError {
    /// Codebook parameters and buffer length disagree, or the shape itself is
    /// unusable (zero extent, or more centroids than a byte code can address).
    #[error(
        "bad codebook shape: {num_subvectors} subvectors x {ks_per_subvector} centroids x \
         {dim_per_subvector} dims with a buffer of {buffer_len} values"
    )]
    BadCodebookShape {
        num_subvectors: usize,
        ks_per_subvector: usize,
        dim_per_subvector: usize,
        buffer_len: usize,
    },

    /// An operation was requested before any quantizer was installed.
    #[error("no quantizer has been initialized")]
    NotInitialized,

    /// The sink or source failed, or delivered a short read/write.
    #[error("quantizer i/o failed: {0}")]
    IoFailed(#[from] std::io::Error),

    /// A deserialized header carries fields that violate the codebook shape
    /// invariants.
    #[error(
        "malformed quantizer header ({reason}): num_subvectors={num_subvectors} \
         ks_per_subvector={ks_per_subvector} dim_per_subvector={dim_per_subvector}"
    )]
    MalformedHeader {
        num_subvectors: i32,
        ks_per_subvector: i32,
        dim_per_subvector: i32,
        reason: &'static str,
    },

    /// A quantize request found no candidate centroid. Unreachable for any
    /// codebook that passed shape validation; reported rather than trusted.
    #[error("subspace {subvector} has no candidate centroid")]
    EmptyCodebook { subvector: usize },
}
