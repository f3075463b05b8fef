//! Microphone mute state types.

/// Whether the default microphone is currently muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicState {
    /// Muted, or no microphone available
    Muted,
    /// Unmuted and passing audio through
    Live,
}

impl MicState {
    pub fn from_muted(muted: bool) -> Self {
        if muted { MicState::Muted } else { MicState::Live }
    }

    pub fn is_muted(&self) -> bool {
        *self == MicState::Muted
    }

    /// Freedesktop icon name for this state.
    pub fn icon_name(&self) -> &'static str {
        match self {
            MicState::Muted => "microphone-sensitivity-muted-symbolic",
            MicState::Live => "microphone-sensitivity-high-symbolic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_muted() {
        assert_eq!(MicState::from_muted(true), MicState::Muted);
        assert_eq!(MicState::from_muted(false), MicState::Live);
        assert!(MicState::Muted.is_muted());
        assert!(!MicState::Live.is_muted());
    }

    #[test]
    fn test_icon_names_differ() {
        assert_eq!(
            MicState::Muted.icon_name(),
            "microphone-sensitivity-muted-symbolic"
        );
        assert_eq!(
            MicState::Live.icon_name(),
            "microphone-sensitivity-high-symbolic"
        );
    }
}
