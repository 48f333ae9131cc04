use crate::errors::RenderError;
use std::path::Path;

/// A JPEG embedded as-is with the `DCTDecode` filter
#[derive(Debug, Clone)]
pub(crate) struct JpegImage {
    pub(crate) data: Vec<u8>,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) components: u8,
}

impl JpegImage {
    pub(crate) fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|source| RenderError::Asset {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data).map_err(|reason| RenderError::UnsupportedImage {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Read the frame header to find the image size.
    pub(crate) fn from_bytes(data: Vec<u8>) -> Result<Self, &'static str> {
        if !data.starts_with(&[0xFF, 0xD8]) {
            return Err("not a JPEG file");
        }

        let mut pos = 2;
        loop {
            while data.get(pos) == Some(&0xFF) {
                pos += 1;
            }
            let marker = *data.get(pos).ok_or("truncated JPEG")?;
            pos += 1;

            match marker {
                // Markers without a payload.
                0x01 | 0xD0..=0xD7 => continue,
                0xD9 | 0xDA => return Err("no frame header before image data"),
                0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                    let frame = data.get(pos..pos + 8).ok_or("truncated frame header")?;
                    let height = u16::from_be_bytes([frame[3], frame[4]]);
                    let width = u16::from_be_bytes([frame[5], frame[6]]);
                    let components = frame[7];
                    if width == 0 || height == 0 {
                        return Err("image has no pixels");
                    }
                    if !matches!(components, 1 | 3 | 4) {
                        return Err("unsupported number of color components");
                    }
                    return Ok(Self {
                        data,
                        width,
                        height,
                        components,
                    });
                }
                _ => {
                    let length = data.get(pos..pos + 2).ok_or("truncated segment")?;
                    let length = usize::from(u16::from_be_bytes([length[0], length[1]]));
                    if length < 2 {
                        return Err("malformed segment length");
                    }
                    pos += length;
                }
            }
        }
    }

    pub(crate) fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}
