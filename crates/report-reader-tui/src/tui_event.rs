use report_reader_core::ResultViewModel;

/// Events flowing from the backend forwarding tasks to the TUI.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// A snapshot published for the submission of the report at `report_index`.
    Update {
        report_index: usize,
        view: ResultViewModel,
    },
}
