//! 8-bit image frames backed by OpenCV matrices, and the pixel operations
//! the detector needs.

use opencv::core::{self, Mat, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

use vigil_common::error::{VigilError, VigilResult};

fn cv_err(stage: &'static str) -> impl FnOnce(opencv::Error) -> VigilError {
    move |e| VigilError::vision(format!("{stage} failed: {e}"))
}

fn mat_type(channels: u8) -> VigilResult<i32> {
    match channels {
        1 => Ok(core::CV_8UC1),
        3 => Ok(core::CV_8UC3),
        4 => Ok(core::CV_8UC4),
        n => Err(VigilError::vision(format!("Unsupported channel count {n}"))),
    }
}

/// A continuous 8-bit image. One channel for grayscale, three for BGR.
#[derive(Debug, Clone)]
pub struct Frame {
    mat: Mat,
}

impl Frame {
    /// Copy a row-major buffer into a new frame.
    pub fn new(width: u32, height: u32, channels: u8, data: &[u8]) -> VigilResult<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(VigilError::vision(format!(
                "Buffer of {} bytes does not match {width}x{height}x{channels}",
                data.len()
            )));
        }
        let mut frame = Self::blank(width, height, channels, 0)?;
        frame
            .mat
            .data_bytes_mut()
            .map_err(cv_err("Frame copy"))?
            .copy_from_slice(data);
        Ok(frame)
    }

    /// A single-channel frame with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> VigilResult<Self> {
        Self::blank(width, height, 1, value)
    }

    fn blank(width: u32, height: u32, channels: u8, value: u8) -> VigilResult<Self> {
        let mat = Mat::new_rows_cols_with_default(
            height as i32,
            width as i32,
            mat_type(channels)?,
            Scalar::all(value as f64),
        )
        .map_err(cv_err("Frame allocation"))?;
        Ok(Self { mat })
    }

    /// Take ownership of an 8-bit matrix, compacting it if it is a view.
    pub fn from_mat(mat: Mat) -> VigilResult<Self> {
        if mat.depth() != core::CV_8U {
            return Err(VigilError::vision(format!(
                "Expected an 8-bit matrix, got depth {}",
                mat.depth()
            )));
        }
        mat_type(u8::try_from(mat.channels()).unwrap_or(0))?;

        let mat = if mat.is_continuous() {
            mat
        } else {
            mat.try_clone().map_err(cv_err("Frame compaction"))?
        };
        Ok(Self { mat })
    }

    pub fn as_mat(&self) -> &Mat {
        &self.mat
    }

    pub fn width(&self) -> u32 {
        self.mat.cols().max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.mat.rows().max(0) as u32
    }

    pub fn channels(&self) -> u8 {
        self.mat.channels().clamp(0, u8::MAX as i32) as u8
    }

    /// Row-major pixel bytes.
    pub fn data(&self) -> &[u8] {
        self.mat.data_bytes().unwrap_or(&[])
    }

    /// Whether two frames can be compared pixel by pixel.
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.channels() == other.channels()
    }

    /// Pixel-wise absolute difference. Shapes must match.
    pub fn abs_diff(&self, other: &Frame) -> VigilResult<Frame> {
        if !self.same_shape(other) {
            return Err(VigilError::vision(format!(
                "Cannot diff {}x{} against {}x{}",
                self.width(),
                self.height(),
                other.width(),
                other.height()
            )));
        }
        let mut out = Mat::default();
        core::absdiff(&self.mat, &other.mat, &mut out).map_err(cv_err("Frame difference"))?;
        Ok(Self { mat: out })
    }

    /// Binary threshold: values strictly above `level` become 255, the rest 0.
    pub fn threshold(&self, level: u8) -> VigilResult<Frame> {
        let mut out = Mat::default();
        imgproc::threshold(
            &self.mat,
            &mut out,
            level as f64,
            255.0,
            imgproc::THRESH_BINARY,
        )
        .map_err(cv_err("Threshold"))?;
        Ok(Self { mat: out })
    }

    /// Sum of all pixel values over all channels.
    pub fn pixel_sum(&self) -> VigilResult<u64> {
        let sums = core::sum_elems(&self.mat).map_err(cv_err("Pixel sum"))?;
        Ok(sums.0.iter().sum::<f64>().round() as u64)
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other) && self.data() == other.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_mismatched_length() {
        assert!(Frame::new(4, 4, 1, &[0; 16]).is_ok());
        assert!(Frame::new(4, 4, 3, &[0; 16]).is_err());
        assert!(Frame::new(4, 4, 2, &[0; 32]).is_err());
    }

    #[test]
    fn new_keeps_pixels_in_row_major_order() {
        let frame = Frame::new(3, 2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.as_mat().at_2d::<u8>(1, 0).unwrap(), &4);
    }

    #[test]
    fn abs_diff_is_symmetric_and_shape_checked() {
        let a = Frame::new(2, 1, 1, &[10, 200]).unwrap();
        let b = Frame::new(2, 1, 1, &[30, 50]).unwrap();
        assert_eq!(a.abs_diff(&b).unwrap().data(), &[20, 150]);
        assert_eq!(b.abs_diff(&a).unwrap().data(), &[20, 150]);
        assert!(a.abs_diff(&Frame::filled(1, 2, 0).unwrap()).is_err());
    }

    #[test]
    fn threshold_is_strictly_greater() {
        let f = Frame::new(3, 1, 1, &[25, 26, 0]).unwrap();
        assert_eq!(f.threshold(25).unwrap().data(), &[0, 255, 0]);
    }

    #[test]
    fn pixel_sum_counts_every_channel() {
        assert_eq!(Frame::filled(4, 3, 2).unwrap().pixel_sum().unwrap(), 24);
        let bgr = Frame::new(2, 1, 3, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(bgr.pixel_sum().unwrap(), 21);
    }

    #[test]
    fn from_mat_rejects_non_8bit() {
        let mat = Mat::new_rows_cols_with_default(2, 2, core::CV_32FC1, Scalar::all(0.0)).unwrap();
        assert!(Frame::from_mat(mat).is_err());
    }

    #[test]
    fn from_mat_round_trips_through_as_mat() {
        let frame = Frame::new(2, 2, 3, &[9; 12]).unwrap();
        let copy = Frame::from_mat(frame.as_mat().try_clone().unwrap()).unwrap();
        assert_eq!(copy, frame);
    }
}
