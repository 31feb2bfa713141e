/// An error type for feature extraction and matching.
#[derive(thiserror::Error, Debug)]
pub enum FeatureError {
    /// Failure inside the ONNX runtime (model load, device placement or
    /// inference).
    #[error("Failed to run the model. {0}")]
    Ort(#[from] ort::Error),

    /// Image error.
    #[error("Image error. {0}")]
    Image(#[from] parallax_image::ImageError),

    /// A model output did not have the expected shape.
    #[error("Unexpected shape for model output '{name}': {shape:?}")]
    UnexpectedOutputShape {
        /// Name of the offending output tensor.
        name: &'static str,
        /// Shape that was returned.
        shape: Vec<i64>,
    },

    /// Keypoint, descriptor and score counts disagree.
    #[error("Feature buffers disagree in length ({0} vs {1})")]
    LengthMismatch(usize, usize),

    /// The two descriptor sets have different dimensionality.
    #[error("Descriptor dimensions do not match ({0} vs {1})")]
    DescriptorDimMismatch(usize, usize),

    /// A correspondence references a keypoint outside its set.
    #[error("Match index ({idx0}, {idx1}) out of bounds for sets of size ({len0}, {len1})")]
    MatchIndexOutOfBounds {
        /// Index into the first keypoint set.
        idx0: i64,
        /// Index into the second keypoint set.
        idx1: i64,
        /// Size of the first keypoint set.
        len0: usize,
        /// Size of the second keypoint set.
        len1: usize,
    },
}
