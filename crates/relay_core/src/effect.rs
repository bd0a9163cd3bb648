use crate::QueryRow;

/// Side effects requested by [`crate::update`]. The engine persists the new
/// snapshot first and then executes these in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the configured start URL.
    NavigateToStart,
    /// Inject the row into the input form and submit it.
    SubmitQuery { row: QueryRow },
    /// Leave the result page for the next input page.
    ReturnToInput,
    /// Autoclick is off; ask before returning to input.
    AwaitConfirmation { remaining: usize },
    /// Hand the final accumulated CSV to the user.
    Download { csv: String },
    /// Delete every persisted session key.
    ClearSession,
}
