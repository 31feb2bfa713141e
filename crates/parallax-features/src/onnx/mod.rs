//! ONNX-backed learned feature extraction and matching.
//!
//! The models are treated as opaque capabilities: any detector export
//! producing `keypoints` / `descriptors` / `scores` tensors and any
//! matcher export producing `matches` / `mscores` tensors can be
//! dropped in. Batch-dimension bookkeeping is owned by the wrappers;
//! everything leaving this module is unbatched.

mod extractor;
pub use extractor::{OnnxExtractor, OnnxExtractorBuilder};

mod matcher;
pub use matcher::{OnnxMatcher, OnnxMatcherBuilder};

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use parallax_image::{ops, Image};

use crate::device::{register_device, Device};
use crate::error::FeatureError;

/// Build an ONNX session on the selected device.
pub(crate) fn build_session(
    model_path: &Path,
    num_threads: usize,
    device: Device,
) -> Result<Session, ort::Error> {
    let builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(num_threads)?;
    let builder = register_device(builder, device)?;
    builder.commit_from_file(model_path)
}

/// Convert an RGB8 image into a normalized NCHW float tensor, batch of
/// one.
pub(crate) fn image_to_nchw(image: &Image<u8, 3>) -> Result<ort::value::Tensor<f32>, FeatureError> {
    // cast and scale the image to f32 in [0, 1]
    let mut image_hwc_f32 = Image::from_size_val(image.size(), 0.0f32)?;
    ops::cast_and_scale(image, &mut image_hwc_f32, 1.0 / 255.0)?;

    // convert HWC -> CHW and add the batch axis
    let image_chw = ops::chw_from_hwc(&image_hwc_f32);
    let shape = [1usize, 3, image.height(), image.width()];

    Ok(ort::value::Tensor::from_array((shape, image_chw))?)
}
