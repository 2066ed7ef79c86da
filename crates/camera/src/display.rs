//! HighGUI preview window with keyboard polling.

use opencv::highgui;

use vigil_common::config::DisplayConfig;
use vigil_common::error::{VigilError, VigilResult};
use vigil_detect::Frame;
use vigil_monitor::{Display, KeyCommand};

/// A named OpenCV window. All windows are destroyed on drop.
pub struct HighGuiDisplay {
    window: String,
    poll_ms: i32,
}

impl HighGuiDisplay {
    pub fn open(config: &DisplayConfig) -> VigilResult<Self> {
        highgui::named_window(&config.window_name, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| VigilError::display(format!("Failed to create window: {e}")))?;
        tracing::debug!(window = %config.window_name, "Preview window created");

        Ok(Self {
            window: config.window_name.clone(),
            poll_ms: i32::try_from(config.poll_interval_ms.max(1)).unwrap_or(i32::MAX),
        })
    }
}

impl Display for HighGuiDisplay {
    fn show(&mut self, frame: &Frame) -> VigilResult<()> {
        highgui::imshow(&self.window, frame.as_mat())
            .map_err(|e| VigilError::display(format!("Failed to show frame: {e}")))
    }

    fn poll_key(&mut self) -> VigilResult<Option<KeyCommand>> {
        let code = highgui::wait_key(self.poll_ms)
            .map_err(|e| VigilError::display(format!("Failed to poll keyboard: {e}")))?;
        Ok(KeyCommand::from_key_code(code))
    }
}

impl Drop for HighGuiDisplay {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            tracing::warn!(error = %e, "Failed to destroy windows");
        }
    }
}
