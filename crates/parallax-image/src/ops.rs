use crate::error::ImageError;
use crate::image::Image;

/// Cast the pixel data of an image to a different type.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image.
/// * `scale` - The scale to multiply the pixel data with.
///
/// Example:
///
/// ```
/// use parallax_image::{Image, ImageSize};
/// use parallax_image::ops::cast_and_scale;
///
/// let image = Image::<u8, 1>::new(
///     ImageSize {
///         width: 2,
///         height: 1,
///     },
///     vec![0u8, 255],
/// ).unwrap();
///
/// let mut image_f32 = Image::from_size_val(image.size(), 0.0f32).unwrap();
///
/// cast_and_scale(&image, &mut image_f32, 1. / 255.0).unwrap();
///
/// assert_eq!(image_f32.as_slice(), [0.0f32, 1.0]);
/// ```
pub fn cast_and_scale<T, U, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<U, C>,
    scale: U,
) -> Result<(), ImageError>
where
    T: Copy + num_traits::NumCast,
    U: Copy + num_traits::NumCast + std::ops::Mul<U, Output = U>,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    dst.as_slice_mut()
        .iter_mut()
        .zip(src.as_slice().iter())
        .try_for_each(|(out, &inp)| {
            let x = U::from(inp).ok_or(ImageError::CastError(
                std::any::type_name::<U>().to_string(),
            ))?;
            *out = x * scale;
            Ok::<(), ImageError>(())
        })?;

    Ok(())
}

/// Repack an HWC image into a CHW-contiguous buffer.
///
/// The returned buffer is laid out planar: all of channel 0, then
/// channel 1, etc. This is the layout expected by NCHW model inputs
/// once a leading batch axis is added.
pub fn chw_from_hwc<const C: usize>(src: &Image<f32, C>) -> Vec<f32> {
    let (w, h) = (src.width(), src.height());
    let hwc = src.as_slice();
    let mut chw = vec![0.0f32; hwc.len()];
    for c in 0..C {
        for y in 0..h {
            for x in 0..w {
                chw[c * h * w + y * w + x] = hwc[(y * w + x) * C + c];
            }
        }
    }
    chw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageSize;

    #[test]
    fn cast_and_scale_size_mismatch() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let mut dst = Image::<f32, 1>::from_size_val([3, 2].into(), 0.0)?;
        assert!(cast_and_scale(&src, &mut dst, 1.0).is_err());
        Ok(())
    }

    #[test]
    fn chw_from_hwc_planar_layout() -> Result<(), ImageError> {
        // 2x1 image, 3 channels: pixels (r0,g0,b0), (r1,g1,b1)
        let src = Image::<f32, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )?;
        let chw = chw_from_hwc(&src);
        assert_eq!(chw, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        Ok(())
    }
}
