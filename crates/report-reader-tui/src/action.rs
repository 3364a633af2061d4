/// Actions that the TUI can process, mapped from keyboard input or internal events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NavigateBack,
    MoveUp,
    MoveDown,
    GoTop,
    GoBottom,
    Submit,
    Resubmit,
    ScrollUp,
    ScrollDown,
    ToggleHelp,
    Tick,
    Resize(u16, u16),
    None,
}
