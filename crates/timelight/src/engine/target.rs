use std::fmt;

pub const MIN_BRIGHTNESS: f64 = 0.0;
pub const MAX_BRIGHTNESS: f64 = 100.0;
pub const MIN_MIREK: u16 = 153;
pub const MAX_MIREK: u16 = 500;

/// What a light should look like. Either field may be absent, meaning "leave
/// this channel alone".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetState {
    /// Brightness percentage (0-100).
    pub brightness: Option<f64>,
    /// Color temperature in mirek (153-500).
    pub color_temp_mirek: Option<u16>,
}

/// Which channels a fixture supports, derived from the sub-objects the bridge
/// reports for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub brightness: bool,
    pub color_temperature: bool,
    pub color: bool,
}

impl TargetState {
    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_color_temp(mut self, mirek: u16) -> Self {
        self.color_temp_mirek = Some(mirek);
        self
    }

    /// Drop every channel the fixture cannot show.
    pub fn restrict(self, capabilities: Capabilities) -> Self {
        Self {
            brightness: self.brightness.filter(|_| capabilities.brightness),
            color_temp_mirek: self
                .color_temp_mirek
                .filter(|_| capabilities.color_temperature),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.brightness.is_none() && self.color_temp_mirek.is_none()
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.brightness {
            Some(b) => write!(f, "brightness={:.1}", b)?,
            None => write!(f, "brightness=N/A")?,
        }
        match self.color_temp_mirek {
            Some(m) => write!(f, " temp_mirek={}", m),
            None => write!(f, " temp_mirek=N/A"),
        }
    }
}
