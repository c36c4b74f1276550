/// What should be on the display right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen<'a> {
    /// Centered, possibly multi-line message
    Text(&'a str),
    Fixation,
    /// Stimulus image, indexed by position in the session's trial order
    Image(usize),
    Blank,
}
