use std::path::Path;

use crate::error::IoError;
use crate::image::{Image, ImageSize};

/// Reads an image from the given file path and converts it to RGB8.
///
/// The method tries to read any image format supported by the image
/// crate and converts the result to an 8-bit RGB image. The file is
/// checked for existence before any decoding work so that a missing
/// input fails fast.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the decoded data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    // open the file and map it to memory
    let file = std::fs::File::open(file_path)?;
    let mmap = unsafe { memmap2::Mmap::map(&file)? };

    // decode the data directly from memory
    let img = image::ImageReader::new(std::io::Cursor::new(&mmap))
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = Image::<u8, 3>::new(size, img.into_rgb8().into_vec())?;

    Ok(image)
}
