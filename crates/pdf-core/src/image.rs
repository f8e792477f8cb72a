//! Images placed into field rectangles

use crate::{PdfError, Rect, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, Stream};
use std::io::Write;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// How an image is sized inside a field rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Fill the rectangle exactly
    Stretch,
    /// Rectangle width, proportional height
    FitWidth,
    /// Rectangle height, proportional width
    FitHeight,
    /// Largest proportional size that fits, centered
    #[default]
    FitBox,
    /// One point per pixel
    Natural,
}

/// Where an image lands on the page, in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Content operators drawing XObject `name` at this placement
    pub(crate) fn draw(&self, name: &str) -> Vec<u8> {
        let Placement {
            x,
            y,
            width,
            height,
        } = self;
        format!("q\n{width} 0 0 {height} {x} {y} cm\n/{name} Do\nQ\n").into_bytes()
    }
}

/// Position an image of the given pixel size inside a field rectangle
///
/// `FitBox` centers the image in the rectangle; the other modes keep the
/// image's top edge on the rectangle's top edge, starting at its left edge.
/// An image with no pixels gets an empty placement at the top-left corner.
pub fn fit_in_rect(
    pixel_width: u32,
    pixel_height: u32,
    rect: &Rect,
    mode: ImageScaleMode,
) -> Placement {
    let (w, h) = (f64::from(pixel_width), f64::from(pixel_height));
    if w == 0.0 || h == 0.0 {
        return Placement {
            x: rect.x1,
            y: rect.y2,
            width: 0.0,
            height: 0.0,
        };
    }

    let (width, height) = match mode {
        ImageScaleMode::Stretch => (rect.width(), rect.height()),
        ImageScaleMode::FitWidth => (rect.width(), rect.width() * h / w),
        ImageScaleMode::FitHeight => (rect.height() * w / h, rect.height()),
        ImageScaleMode::FitBox => {
            let scale = (rect.width() / w).min(rect.height() / h);
            (w * scale, h * scale)
        }
        ImageScaleMode::Natural => (w, h),
    };

    let (x, y) = match mode {
        ImageScaleMode::FitBox => (
            rect.x1 + (rect.width() - width) / 2.0,
            rect.y1 + (rect.height() - height) / 2.0,
        ),
        _ => (rect.x1, rect.y2 - height),
    };

    Placement {
        x,
        y,
        width,
        height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    fn name(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
            Self::Cmyk => "DeviceCMYK",
        }
    }
}

/// An image ready to be added to the document as an XObject
#[derive(Debug, Clone)]
pub(crate) struct ImageXObject {
    pub width: u32,
    pub height: u32,
    color_space: ColorSpace,
    filter: &'static str,
    /// Samples are stored inverted (Adobe CMYK JPEGs)
    inverted: bool,
    data: Vec<u8>,
}

impl ImageXObject {
    /// Read JPEG or PNG file bytes
    ///
    /// JPEG data is embedded as is (`DCTDecode`). PNG data is decoded, any
    /// alpha is composited onto white and the samples are Flate compressed.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.starts_with(JPEG_MAGIC) {
            Self::from_jpeg(data)
        } else if data.starts_with(PNG_MAGIC) {
            Self::from_png(data)
        } else {
            Err(PdfError::ImageError(
                "Unrecognized image data (expected JPEG or PNG)".to_string(),
            ))
        }
    }

    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let frame = read_jpeg_frame(data)?;
        let color_space = match frame.components {
            1 => ColorSpace::Gray,
            3 => ColorSpace::Rgb,
            4 => ColorSpace::Cmyk,
            n => {
                return Err(PdfError::ImageError(format!(
                    "Unsupported JPEG with {n} color components"
                )))
            }
        };

        Ok(Self {
            width: frame.width,
            height: frame.height,
            color_space,
            filter: "DCTDecode",
            inverted: color_space == ColorSpace::Cmyk && frame.adobe,
            data: data.to_vec(),
        })
    }

    fn from_png(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Png)?;

        let (color_space, samples): (_, Vec<u8>) = if decoded.color().has_color() {
            let samples = decoded
                .to_rgba8()
                .pixels()
                .flat_map(|p| {
                    let [r, g, b, a] = p.0;
                    [over_white(r, a), over_white(g, a), over_white(b, a)]
                })
                .collect();
            (ColorSpace::Rgb, samples)
        } else {
            let samples = decoded
                .to_luma_alpha8()
                .pixels()
                .map(|p| over_white(p.0[0], p.0[1]))
                .collect();
            (ColorSpace::Gray, samples)
        };

        let compress_error = |e: std::io::Error| PdfError::ImageError(format!("Compression failed: {e}"));
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&samples).map_err(compress_error)?;
        let compressed = encoder.finish().map_err(compress_error)?;

        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            color_space,
            filter: "FlateDecode",
            inverted: false,
            data: compressed,
        })
    }

    pub fn into_stream(self) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(self.width),
            "Height" => i64::from(self.height),
            "ColorSpace" => self.color_space.name(),
            "BitsPerComponent" => 8i64,
            "Filter" => self.filter,
        };
        if self.inverted {
            let decode: Vec<Object> = (0..4)
                .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
                .collect();
            dict.set("Decode", decode);
        }
        Stream::new(dict, self.data)
    }
}

/// Composite a sample with coverage `alpha` onto a white background
fn over_white(value: u8, alpha: u8) -> u8 {
    let (v, a) = (u16::from(value), u16::from(alpha));
    ((v * a + 255 * (255 - a) + 127) / 255) as u8
}

/// What embedding needs from a JPEG: the frame size and component count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
    /// An Adobe APP14 segment precedes the frame
    adobe: bool,
}

/// Walk the JPEG marker segments up to the first start-of-frame
fn read_jpeg_frame(data: &[u8]) -> Result<JpegFrame> {
    let mut pos = 2;
    let mut adobe = false;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        match marker {
            // Fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // Markers without a length
            0x01 | 0xD0..=0xD8 => {
                pos += 2;
                continue;
            }
            // End of image or start of scan: no frame header before the data
            0xD9 | 0xDA => break,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
        if length < 2 {
            break;
        }
        let end = (pos + 2 + length).min(data.len());
        let segment = &data[pos + 4..end];

        match marker {
            0xEE if segment.starts_with(b"Adobe") => adobe = true,
            // SOF0..SOF15, except DHT, JPG and DAC
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                if segment.len() < 6 {
                    break;
                }
                return Ok(JpegFrame {
                    height: u32::from(u16::from_be_bytes([segment[1], segment[2]])),
                    width: u32::from(u16::from_be_bytes([segment[3], segment[4]])),
                    components: segment[5],
                    adobe,
                });
            }
            _ => {}
        }

        pos += 2 + length;
    }

    Err(PdfError::ImageError("JPEG has no frame header".to_string()))
}
