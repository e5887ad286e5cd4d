//! Captured frame types.

use bytes::{Bytes, BytesMut};
use pipview_ipc::{Rect, Size};

use crate::error::CaptureError;
use crate::CaptureResult;

/// Pixel layout of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32-bit BGRA, the format streams are configured with.
    Bgra8,

    /// 32-bit RGBA.
    Rgba8,
}

impl PixelFormat {
    /// Bytes used by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8 | Self::Rgba8 => 4,
        }
    }
}

/// A decoded video frame backed by shared memory.
///
/// Rows may be padded: `bytes_per_row` can exceed
/// `width * bytes_per_pixel`. Images produced by [`PixelImage::crop`] and
/// [`PixelImage::deep_copy`] are always tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    data: Bytes,
    width: u32,
    height: u32,
    bytes_per_row: usize,
    format: PixelFormat,
}

impl PixelImage {
    /// Wrap existing pixel memory.
    pub fn new(
        data: Bytes,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: PixelFormat,
    ) -> CaptureResult<Self> {
        let too_large = || {
            CaptureError::FrameConversion(format!(
                "{width}x{height} image with stride {bytes_per_row} is too large"
            ))
        };

        let row_len = (width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(too_large)?;
        if bytes_per_row < row_len {
            return Err(CaptureError::FrameConversion(format!(
                "row stride {bytes_per_row} shorter than {width} pixels"
            )));
        }

        let required = match height {
            0 => 0,
            h => bytes_per_row
                .checked_mul(h as usize - 1)
                .and_then(|len| len.checked_add(row_len))
                .ok_or_else(too_large)?,
        };
        if data.len() < required {
            return Err(CaptureError::FrameConversion(format!(
                "{} bytes cannot hold a {width}x{height} image",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            bytes_per_row,
            format,
        })
    }

    /// Wrap tightly packed pixel memory.
    pub fn packed(data: Bytes, width: u32, height: u32, format: PixelFormat) -> CaptureResult<Self> {
        Self::new(
            data,
            width,
            height,
            width as usize * format.bytes_per_pixel(),
            format,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Image dimensions as a size.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Returns true if rows carry no padding.
    pub fn is_packed(&self) -> bool {
        self.bytes_per_row == self.width as usize * self.format.bytes_per_pixel()
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.bytes_per_row;
        let len = self.width as usize * self.format.bytes_per_pixel();
        self.data.get(start..start + len)
    }

    /// Bytes of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = x as usize * bpp;
        self.row(y).map(|row| &row[offset..offset + bpp])
    }

    /// Copy out the sub-image covered by `rect`, in pixel units.
    ///
    /// The rectangle's origin and size are truncated to whole pixels. It
    /// must have a non-zero area and lie entirely inside the image;
    /// anything else fails without producing an image.
    pub fn crop(&self, rect: &Rect) -> CaptureResult<PixelImage> {
        let finite = [rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || rect.x < 0.0 || rect.y < 0.0 {
            return Err(CaptureError::FrameConversion(format!(
                "crop rect {rect:?} has an invalid origin"
            )));
        }

        let x = rect.x as u64;
        let y = rect.y as u64;
        let width = rect.width.max(0.0) as u64;
        let height = rect.height.max(0.0) as u64;

        if width == 0 || height == 0 {
            return Err(CaptureError::FrameConversion(format!(
                "crop rect {rect:?} has no area"
            )));
        }

        let exceeds = |origin: u64, len: u64, bound: u32| {
            origin
                .checked_add(len)
                .map_or(true, |end| end > u64::from(bound))
        };
        if exceeds(x, width, self.width) || exceeds(y, height, self.height) {
            return Err(CaptureError::FrameConversion(format!(
                "crop rect {rect:?} exceeds {}x{} frame",
                self.width, self.height
            )));
        }

        Ok(self.copy_region(x as u32, y as u32, width as u32, height as u32))
    }

    /// Copy the whole image into freshly allocated, tightly packed memory.
    pub fn deep_copy(&self) -> PixelImage {
        self.copy_region(0, 0, self.width, self.height)
    }

    /// Row-by-row copy of an in-bounds region.
    fn copy_region(&self, x: u32, y: u32, width: u32, height: u32) -> PixelImage {
        let bpp = self.format.bytes_per_pixel();
        let row_len = width as usize * bpp;
        let mut out = BytesMut::with_capacity(row_len * height as usize);

        for row in y..y + height {
            let start = row as usize * self.bytes_per_row + x as usize * bpp;
            out.extend_from_slice(&self.data[start..start + row_len]);
        }

        PixelImage {
            data: out.freeze(),
            width,
            height,
            bytes_per_row: row_len,
            format: self.format,
        }
    }
}

/// Delivery status the platform attaches to every video sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A new frame was rendered.
    Complete,

    /// Nothing changed since the previous frame.
    Idle,

    /// The content is blank.
    Blank,

    /// Delivery is suspended.
    Suspended,

    /// First sample of a stream.
    Started,

    /// Last sample of a stream.
    Stopped,
}

/// A raw video sample as handed over by the platform stream, with its
/// attachments. Every field may be missing on malformed samples.
#[derive(Debug, Clone, Default)]
pub struct VideoSample {
    pub status: Option<FrameStatus>,
    pub image: Option<PixelImage>,
    pub content_rect: Option<Rect>,
    pub content_scale: Option<f64>,
    pub scale_factor: Option<f64>,
}

/// A frame ready for presentation.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Pixel data, already cropped when capturing a region.
    pub image: PixelImage,

    /// Area of the source the image covers.
    pub content_rect: Rect,

    /// Scale applied by the platform to fit the content.
    pub content_scale: f64,

    /// Backing scale factor of the source.
    pub scale_factor: f64,
}

impl CapturedFrame {
    /// Create a new captured frame.
    pub fn new(image: PixelImage, content_rect: Rect, content_scale: f64, scale_factor: f64) -> Self {
        Self {
            image,
            content_rect,
            content_scale,
            scale_factor,
        }
    }

    /// Size of the captured content.
    pub fn size(&self) -> Size {
        self.content_rect.size()
    }
}

/// One item of a session's event sequence.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A new frame.
    Captured(CapturedFrame),

    /// No new frame this tick. Used as a heartbeat.
    Idle,
}

impl Frame {
    /// Turn a raw sample into a frame, cropping it when `crop` is set.
    ///
    /// Returns `Ok(None)` for samples that carry nothing to present
    /// (blank, suspended, start/stop markers) and an error for malformed
    /// samples or failed crops. Callers drop the sample in both cases.
    pub fn from_sample(sample: VideoSample, crop: Option<&Rect>) -> CaptureResult<Option<Frame>> {
        match sample.status {
            Some(FrameStatus::Complete) => {}
            Some(FrameStatus::Idle) => return Ok(Some(Frame::Idle)),
            Some(_) => return Ok(None),
            None => {
                return Err(CaptureError::FrameConversion(
                    "sample has no status attachment".to_string(),
                ))
            }
        }

        let image = sample.image.ok_or_else(|| {
            CaptureError::FrameConversion("sample has no image surface".to_string())
        })?;

        let (Some(content_rect), Some(content_scale), Some(scale_factor)) =
            (sample.content_rect, sample.content_scale, sample.scale_factor)
        else {
            return Err(CaptureError::FrameConversion(
                "sample is missing content attachments".to_string(),
            ));
        };

        let frame = match crop {
            Some(rect) => CapturedFrame::new(image.crop(rect)?, *rect, content_scale, scale_factor),
            None => CapturedFrame::new(image.deep_copy(), content_rect, content_scale, scale_factor),
        };

        Ok(Some(Frame::Captured(frame)))
    }
}
