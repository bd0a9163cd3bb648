use crate::{Effect, Msg, ResultAccumulator, SessionError, SessionSnapshot};

/// Pure update function: applies a message to a snapshot and returns the
/// snapshot to persist together with the effects to run afterwards.
pub fn update(
    mut state: SessionSnapshot,
    msg: Msg,
) -> Result<(SessionSnapshot, Vec<Effect>), SessionError> {
    let effects = match msg {
        Msg::QueriesUploaded { queue } => {
            state.queue = Some(queue);
            state.results = ResultAccumulator::default();
            vec![Effect::NavigateToStart]
        }
        Msg::InputPageLoaded => {
            let queue = state.queue.as_mut().ok_or(SessionError::NoQueryFile)?;
            let row = queue.pop_front().ok_or(SessionError::QueueExhausted)?;
            vec![Effect::SubmitQuery { row }]
        }
        Msg::ResultPageLoaded { scraped } => {
            let remaining = state
                .queue
                .as_ref()
                .ok_or(SessionError::NoQueryFile)?
                .len();
            state.results.append(&scraped);
            if remaining == 0 {
                vec![
                    Effect::Download {
                        csv: state.results.as_str().to_string(),
                    },
                    Effect::ClearSession,
                ]
            } else if state.autoclick {
                vec![Effect::ReturnToInput]
            } else {
                vec![Effect::AwaitConfirmation { remaining }]
            }
        }
        Msg::AutoclickChanged(enabled) => {
            state.autoclick = enabled;
            Vec::new()
        }
    };

    Ok((state, effects))
}
