#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

use parallax_image::{Image, ImageError, ImageSize};

/// An error type for the visualization helpers.
#[derive(thiserror::Error, Debug)]
pub enum VizError {
    /// Image error.
    #[error("Image error. {0}")]
    Image(#[from] ImageError),

    /// Failed to log to the recording stream.
    #[error("Failed to log to the recording stream. {0}")]
    Rerun(#[from] rerun::RecordingStreamError),
}

/// Join two RGB images horizontally onto a single canvas.
///
/// The canvas is `w0 + w1` wide and as tall as the taller input; the
/// area below a shorter image is left black.
pub fn side_by_side(
    image0: &Image<u8, 3>,
    image1: &Image<u8, 3>,
) -> Result<Image<u8, 3>, ImageError> {
    let (w0, h0) = (image0.width(), image0.height());
    let (w1, h1) = (image1.width(), image1.height());

    let mut out = Image::from_size_val(
        ImageSize {
            width: w0 + w1,
            height: h0.max(h1),
        },
        0u8,
    )?;

    let out_row_len = (w0 + w1) * 3;
    let src0 = image0.as_slice();
    let src1 = image1.as_slice();
    let dst = out.as_slice_mut();

    for row in 0..h0 {
        let dst_start = row * out_row_len;
        dst[dst_start..dst_start + w0 * 3].copy_from_slice(&src0[row * w0 * 3..(row + 1) * w0 * 3]);
    }
    for row in 0..h1 {
        let dst_start = row * out_row_len + w0 * 3;
        dst[dst_start..dst_start + w1 * 3].copy_from_slice(&src1[row * w1 * 3..(row + 1) * w1 * 3]);
    }

    Ok(out)
}

/// Build line segments connecting matched keypoints on a joined canvas.
///
/// `pts0` and `pts1` are the matched coordinates in their own image
/// frames, `pts0[i]` corresponding to `pts1[i]`; `x_offset` shifts the
/// second set right by the width of the first image. Returns an empty
/// vector when there are no matches.
pub fn match_segments(
    pts0: &[[f32; 2]],
    pts1: &[[f32; 2]],
    x_offset: f32,
) -> Vec<[(f32, f32); 2]> {
    pts0.iter()
        .zip(pts1.iter())
        .map(|(p0, p1)| [(p0[0], p0[1]), (p1[0] + x_offset, p1[1])])
        .collect()
}

/// Shift keypoints right for drawing on a joined canvas.
pub fn shifted_points(pts: &[[f32; 2]], x_offset: f32) -> Vec<[f32; 2]> {
    pts.iter().map(|p| [p[0] + x_offset, p[1]]).collect()
}

/// Log both images side by side with their matched keypoints connected
/// by lines.
///
/// With zero matches the joined image is still logged and no lines are
/// drawn. Purely for human inspection; nothing downstream consumes the
/// result.
pub fn log_matches(
    rec: &rerun::RecordingStream,
    entity: &str,
    image0: &Image<u8, 3>,
    image1: &Image<u8, 3>,
    pts0: &[[f32; 2]],
    pts1: &[[f32; 2]],
) -> Result<(), VizError> {
    let joined = side_by_side(image0, image1)?;
    let x_offset = image0.width() as f32;

    rec.log(
        entity.to_owned(),
        &rerun::Image::from_elements(
            joined.as_slice(),
            joined.size().into(),
            rerun::ColorModel::RGB,
        ),
    )?;

    rec.log(
        format!("{entity}/keypoints0"),
        &rerun::Points2D::new(pts0.to_vec()),
    )?;
    rec.log(
        format!("{entity}/keypoints1"),
        &rerun::Points2D::new(shifted_points(pts1, x_offset)),
    )?;
    rec.log(
        format!("{entity}/matches"),
        &rerun::LineStrips2D::new(match_segments(pts0, pts1, x_offset))
            .with_colors([rerun::Color::from_rgb(0, 255, 0)])
            .with_radii([0.2]),
    )?;

    Ok(())
}
