/// Lifecycle of a single revealable element. Ordered so that a state only
/// ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RevealState {
    Pending,
    Observed,
    Revealed,
}

impl RevealState {
    /// Moves to `next` if it is further along than the current state.
    /// Returns whether anything changed.
    pub fn advance(&mut self, next: RevealState) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}
