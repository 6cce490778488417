use arboard::Clipboard;
use ratatui::style::Color;
use tracing::warn;

use super::UnlockApp;
use crate::icons::Icons;
use crate::theme::Theme;

const GLOW_STEPS: u8 = 9;

impl UnlockApp {
    pub fn spinner_frame(&self) -> &'static str {
        Icons::SPINNER[self.animation_frame as usize % Icons::SPINNER.len()]
    }

    /// Footer border colour; brightens while an unlock is in flight.
    pub fn footer_glow(&self) -> Color {
        if !self.card.form().is_submitting() {
            return Theme::inactive_border();
        }
        // Triangle wave, 0..=GLOW_STEPS and back
        let step = self.animation_frame % (2 * GLOW_STEPS);
        let level = if step <= GLOW_STEPS { step } else { 2 * GLOW_STEPS - step };
        let blue = 120 + level * 15;
        Color::Rgb(0, blue / 2, blue)
    }

    pub fn copy_address_to_clipboard(&mut self) {
        let address = self.card.description().to_string();
        let result = Clipboard::new().and_then(|mut clipboard| clipboard.set_text(address));

        self.status_message = Some(match result {
            Ok(()) => "✓ Address copied to clipboard".to_string(),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                format!("Failed to copy to clipboard: {}", e)
            }
        });
    }
}
