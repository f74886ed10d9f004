use crate::paginator::CyclePayload;

#[derive(Debug)]
pub enum Action {
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    /// Evaluate the scroll trigger without moving
    CheckScroll,
    /// Both fetches of the running cycle have resolved
    CycleFinished(Box<CyclePayload>),

    OpenInBrowser,
    YankUrl,

    None,
}

impl Action {
    /// Actions that move the viewport and so re-evaluate the scroll trigger
    pub fn is_scroll(&self) -> bool {
        matches!(
            self,
            Action::ScrollUp
                | Action::ScrollDown
                | Action::PageUp
                | Action::PageDown
                | Action::GoToTop
                | Action::GoToBottom
                | Action::CheckScroll
        )
    }
}
