/// Errors returned by two-view pose estimation.
#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    /// Input correspondences are fewer than the solver minimum.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimum required correspondences for the solver.
        required: usize,
        /// Number of correspondences supplied.
        actual: usize,
    },

    /// Input point sequences have different lengths.
    #[error("Point sequences have mismatched lengths ({0} vs {1})")]
    MismatchedLengths(usize, usize),

    /// The point configuration does not constrain a unique model.
    #[error("Degenerate point configuration")]
    DegenerateConfiguration,

    /// RANSAC failed to find a model with enough inliers.
    #[error("RANSAC failed to find a valid model")]
    RansacFailure,

    /// No decomposition candidate places points in front of both cameras.
    #[error("No pose candidate passed the cheirality check")]
    CheiralityFailure,
}
