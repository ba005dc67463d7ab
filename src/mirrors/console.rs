//! Console commands toggling the mirror debug features.

use std::str::FromStr;

use super::*;

/// A parsed mirror console command, apply it with [MirrorDebugSettings::apply].
///
/// ```
/// # use bevy_basic_mirrors::*;
/// let mut debug = MirrorDebugSettings::default();
/// debug.apply("cl_debug_overlay_mirror 1".parse().unwrap());
/// assert!(debug.draw_overlay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorConsoleCommand {
    /// `cl_debug_overlay_mirror <bool>`
    DebugOverlay(bool),
    /// `cl_mirror_update <bool>`
    UpdateGeometry(bool),
}

impl MirrorConsoleCommand {
    pub const DEBUG_OVERLAY: &'static str = "cl_debug_overlay_mirror";
    pub const UPDATE_GEOMETRY: &'static str = "cl_mirror_update";
}

impl FromStr for MirrorConsoleCommand {
    type Err = MirrorError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let constructor: fn(bool) -> Self = match name {
            Self::DEBUG_OVERLAY => Self::DebugOverlay,
            Self::UPDATE_GEOMETRY => Self::UpdateGeometry,
            _ => return Err(MirrorError::UnknownCommand(name.to_owned())),
        };
        let argument = words
            .next()
            .ok_or_else(|| MirrorError::MissingArgument(name.to_owned()))?;
        Ok(constructor(parse_toggle(argument)?))
    }
}

fn parse_toggle(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(MirrorError::InvalidToggle(value.to_owned())),
    }
}

impl MirrorDebugSettings {
    pub fn apply(&mut self, command: MirrorConsoleCommand) {
        match command {
            MirrorConsoleCommand::DebugOverlay(enabled) => self.draw_overlay = enabled,
            MirrorConsoleCommand::UpdateGeometry(enabled) => self.update_geometry = enabled,
        }
    }
}
