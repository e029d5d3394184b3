use viewport_badge_protocol::Settings;

/// How the label currently appears on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Removed from layout (`display: none`).
    #[default]
    Hidden,
    /// Laid out at full opacity.
    Visible,
    /// Still laid out, faded to zero opacity. A resize can bring it back
    /// without recreating the element.
    Faded,
}

impl Presence {
    pub fn opacity(self) -> f64 {
        match self {
            Self::Visible => 1.0,
            Self::Hidden | Self::Faded => 0.0,
        }
    }

    /// Whether the label takes part in layout.
    pub fn is_displayed(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// What applying the visibility policy for a settings snapshot amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPlan {
    Hidden,
    /// Visible with no auto-hide.
    Pinned,
    /// Visible now, fade after the delay.
    ShowThenFade { after_ms: u32 },
}

pub fn plan(settings: &Settings) -> VisibilityPlan {
    if !settings.enabled {
        return VisibilityPlan::Hidden;
    }
    match settings.auto_hide_delay() {
        Some(after_ms) => VisibilityPlan::ShowThenFade { after_ms },
        None => VisibilityPlan::Pinned,
    }
}

/// A resize counts as renewed attention only for an enabled, auto-hiding
/// label.
pub fn resize_reveals(settings: &Settings) -> bool {
    matches!(plan(settings), VisibilityPlan::ShowThenFade { .. })
}
