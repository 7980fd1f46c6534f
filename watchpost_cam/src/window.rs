use crate::camera::CapturedFrame;
use opencv::highgui;
use tracing::{debug, warn};
use watchpost::error::SessionError;
use watchpost::session::{Display, KeyAction};

const KEY_POLL_MS: i32 = 1;
const ESCAPE: i32 = 27;

/// Interactive preview window. Pressing `q` or Escape ends the session.
pub struct PreviewWindow {
    title: String,
}

impl PreviewWindow {
    pub fn open(title: &str) -> opencv::Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            title: title.to_string(),
        })
    }
}

/// Maps a raw `wait_key` code onto a session action.
pub fn key_action(code: i32) -> KeyAction {
    if code < 0 {
        return KeyAction::Continue;
    }
    match code & 0xFF {
        ESCAPE => KeyAction::Quit,
        key if key == 'q' as i32 => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

impl Display<CapturedFrame> for PreviewWindow {
    fn show(&mut self, frame: &CapturedFrame) -> Result<KeyAction, SessionError> {
        highgui::imshow(&self.title, frame.mat())
            .map_err(|e| SessionError::Display(e.to_string()))?;
        let code =
            highgui::wait_key(KEY_POLL_MS).map_err(|e| SessionError::Display(e.to_string()))?;
        Ok(key_action(code))
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        match highgui::destroy_all_windows() {
            Ok(()) => debug!(title = %self.title, "windows closed"),
            Err(e) => warn!(error = %e, "failed to close windows"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        assert_eq!(key_action('q' as i32), KeyAction::Quit);
        assert_eq!(key_action(27), KeyAction::Quit);
        // Some backends set high bits on key codes.
        assert_eq!(key_action(0x100000 | 'q' as i32), KeyAction::Quit);
    }

    #[test]
    fn other_keys_and_timeouts_continue() {
        assert_eq!(key_action(-1), KeyAction::Continue);
        assert_eq!(key_action('a' as i32), KeyAction::Continue);
        assert_eq!(key_action('Q' as i32), KeyAction::Continue);
    }
}
