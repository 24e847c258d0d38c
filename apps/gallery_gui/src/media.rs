//! Image decoding for gallery thumbnails and the preview window.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImagePurpose {
    Thumbnail,
    Preview,
}

impl ImagePurpose {
    pub fn max_dimension(self) -> u32 {
        match self {
            ImagePurpose::Thumbnail => 400,
            ImagePurpose::Preview => 1600,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImagePurpose::Thumbnail => "thumbnail",
            ImagePurpose::Preview => "preview",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let dynamic = if dynamic.width() > max_dimension || dynamic.height() > max_dimension {
        dynamic.thumbnail(max_dimension, max_dimension)
    } else {
        dynamic
    };
    let rgba = dynamic.to_rgba8();
    Ok(PreviewImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    })
}
