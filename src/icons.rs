// ASCII glyphs that render in any terminal font

pub struct Icons;

impl Icons {
    pub const UNLOCK: &'static str = "[O]";
    pub const ACCOUNT: &'static str = "[@]";
    pub const KEYBOARD: &'static str = "[K]";

    /// Braille spinner shown on the submit control while unlocking
    pub const SPINNER: [&'static str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

    /// Character used to mask each password character
    pub const MASK: char = '•';
}
