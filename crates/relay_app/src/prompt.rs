use std::io::{self, BufRead, Write};

use relay_engine::Confirmer;

/// Asks on the terminal before each next query when autoclick is off.
pub struct StdinConfirmer;

#[async_trait::async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, remaining: usize) -> bool {
        let answer = tokio::task::spawn_blocking(move || {
            print!("{remaining} queries left. Continue? [Y/n] ");
            io::stdout().flush()?;
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>((read > 0).then_some(line))
        })
        .await;
        // Closed stdin counts as "no".
        match answer {
            Ok(Ok(Some(line))) => is_yes(&line),
            _ => false,
        }
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}
