use serde::Deserialize;

/// Marker class that keeps an element present in the layout but visually deferred.
pub const HIDDEN_CLASS: &str = "anim-hidden";
/// Class that settles an element into its final visible state.
pub const VISIBLE_CLASS: &str = "anim-visible";

/// Animation profiles the stylesheet knows about. The profile class stays on
/// the element for its whole life; the stylesheet pairs it with
/// `anim-hidden` to pick the entry offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    FadeUp,
    SlideLeft,
    SlideRight,
    DiagramNode,
}

impl Profile {
    pub fn class(self) -> &'static str {
        match self {
            Profile::FadeUp => "anim-fade-up",
            Profile::SlideLeft => "anim-slide-left",
            Profile::SlideRight => "anim-slide-right",
            Profile::DiagramNode => "anim-diagram-node",
        }
    }
}
