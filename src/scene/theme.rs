use crate::foundation::core::Rgba8;

/// Palette shared by every scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background_top: Rgba8,
    pub background_bottom: Rgba8,
    pub primary: Rgba8,
    pub text: Rgba8,
    pub secondary: Rgba8,
    pub negative: Rgba8,
    /// Translucent fill behind leaderboard rows.
    pub panel: Rgba8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_top: Rgba8::rgb(0x1a, 0x1a, 0x2e),
            background_bottom: Rgba8::rgb(0x0f, 0x0f, 0x23),
            primary: Rgba8::rgb(0x1d, 0xb9, 0x54),
            text: Rgba8::rgb(0xff, 0xff, 0xff),
            secondary: Rgba8::rgb(0xb3, 0xb3, 0xb3),
            negative: Rgba8::rgb(0xe7, 0x4c, 0x3c),
            panel: Rgba8::rgb(0xff, 0xff, 0xff).with_alpha(20),
        }
    }
}
