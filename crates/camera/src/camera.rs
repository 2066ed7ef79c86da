//! OpenCV webcam frame source.

use opencv::core::{self, Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use vigil_common::config::CameraConfig;
use vigil_common::error::{VigilError, VigilResult};
use vigil_detect::Frame;
use vigil_monitor::{CapturedFrame, FrameSource};

/// A webcam opened through OpenCV's `VideoCapture`.
///
/// The device is released when the value is dropped.
pub struct OpenCvCamera {
    capture: VideoCapture,
    name: String,
    frame_width: u32,
    baseline_kernel: i32,
    frame_kernel: i32,
}

impl OpenCvCamera {
    /// Open the configured device and request the capture resolution.
    pub fn open(config: &CameraConfig) -> VigilResult<Self> {
        let mut capture = VideoCapture::new(config.device_index, videoio::CAP_ANY)
            .map_err(|e| VigilError::camera(format!("Could not open camera: {e}")))?;

        let opened = capture
            .is_opened()
            .map_err(|e| VigilError::camera(format!("Could not query camera: {e}")))?;
        if !opened {
            return Err(VigilError::camera(format!(
                "Could not open camera {}",
                config.device_index
            )));
        }

        for (prop, value) in [
            (videoio::CAP_PROP_FRAME_WIDTH, config.capture_width),
            (videoio::CAP_PROP_FRAME_HEIGHT, config.capture_height),
        ] {
            let accepted = capture.set(prop, value as f64).unwrap_or(false);
            if !accepted {
                tracing::warn!(prop, value, "Camera rejected capture property");
            }
        }

        let name = format!("camera{}", config.device_index);
        tracing::info!(
            camera = %name,
            width = config.capture_width,
            height = config.capture_height,
            "Camera opened"
        );

        Ok(Self {
            capture,
            name,
            frame_width: config.frame_width.max(1),
            baseline_kernel: odd_kernel(config.baseline_blur_kernel),
            frame_kernel: odd_kernel(config.frame_blur_kernel),
        })
    }

    /// Open the device, grab one frame and report its size. Used by
    /// `vigil check`.
    pub fn probe(config: &CameraConfig) -> VigilResult<(u32, u32)> {
        let mut camera = Self::open(config)?;
        let raw = camera
            .grab()?
            .ok_or_else(|| VigilError::camera("Camera opened but delivered no frame"))?;
        Ok((raw.cols() as u32, raw.rows() as u32))
    }

    fn grab(&mut self) -> VigilResult<Option<Mat>> {
        let mut raw = Mat::default();
        let ok = self
            .capture
            .read(&mut raw)
            .map_err(|e| VigilError::camera(format!("Failed to read frame: {e}")))?;
        if !ok || raw.empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    fn read_with_kernel(&mut self, kernel: i32) -> VigilResult<Option<CapturedFrame>> {
        match self.grab()? {
            Some(raw) => preprocess(&raw, self.frame_width, kernel).map(Some),
            None => Ok(None),
        }
    }
}

impl FrameSource for OpenCvCamera {
    fn read(&mut self) -> VigilResult<Option<CapturedFrame>> {
        self.read_with_kernel(self.frame_kernel)
    }

    fn read_baseline(&mut self) -> VigilResult<Option<CapturedFrame>> {
        self.read_with_kernel(self.baseline_kernel)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => tracing::debug!(camera = %self.name, "Camera released"),
            Err(e) => tracing::warn!(camera = %self.name, error = %e, "Camera release failed"),
        }
    }
}

/// Resize to `width` (aspect preserved), then derive the grayscale,
/// blurred analysis frame.
fn preprocess(raw: &Mat, width: u32, kernel: i32) -> VigilResult<CapturedFrame> {
    let err = |stage: &str, e: opencv::Error| VigilError::camera(format!("{stage} failed: {e}"));

    let height = scaled_height(raw.cols() as u32, raw.rows() as u32, width);
    let mut resized = Mat::default();
    imgproc::resize(
        raw,
        &mut resized,
        Size::new(width as i32, height as i32),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )
    .map_err(|e| err("Resize", e))?;

    let mut gray = Mat::default();
    imgproc::cvt_color(&resized, &mut gray, imgproc::COLOR_BGR2GRAY, 0)
        .map_err(|e| err("Grayscale conversion", e))?;

    let mut blurred = Mat::default();
    imgproc::gaussian_blur(
        &gray,
        &mut blurred,
        Size::new(kernel, kernel),
        0.0,
        0.0,
        core::BORDER_DEFAULT,
    )
    .map_err(|e| err("Gaussian blur", e))?;

    Ok(CapturedFrame {
        preview: Frame::from_mat(resized)?,
        analysis: Frame::from_mat(blurred)?,
    })
}

/// Height that keeps the aspect ratio when scaling `src_w` to `dst_w`,
/// truncated like integer pixel math does.
fn scaled_height(src_w: u32, src_h: u32, dst_w: u32) -> u32 {
    if src_w == 0 {
        return 1;
    }
    ((src_h as u64 * dst_w as u64) / src_w as u64).max(1) as u32
}

/// Gaussian kernels must be odd and positive.
fn odd_kernel(size: u32) -> i32 {
    let size = size.max(1);
    let odd = if size % 2 == 0 { size + 1 } else { size };
    if odd != size {
        tracing::warn!(requested = size, using = odd, "Blur kernel must be odd");
    }
    odd as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_height_keeps_aspect() {
        assert_eq!(scaled_height(640, 480, 500), 375);
        assert_eq!(scaled_height(1280, 720, 500), 281);
        assert_eq!(scaled_height(0, 480, 500), 1);
    }

    #[test]
    fn kernels_are_forced_odd() {
        assert_eq!(odd_kernel(21), 21);
        assert_eq!(odd_kernel(4), 5);
        assert_eq!(odd_kernel(0), 1);
    }

    #[test]
    fn preprocess_produces_gray_analysis_frame() {
        let raw = Mat::new_rows_cols_with_default(
            480,
            640,
            core::CV_8UC3,
            core::Scalar::new(10.0, 20.0, 30.0, 0.0),
        )
        .unwrap();
        let captured = preprocess(&raw, 500, 5).unwrap();
        assert_eq!(captured.preview.channels(), 3);
        assert_eq!(captured.preview.width(), 500);
        assert_eq!(captured.analysis.channels(), 1);
        assert_eq!(captured.analysis.height(), 375);
    }
}
