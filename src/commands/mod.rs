mod config_cmd;
mod food;
mod item;

use clap::ValueEnum;
use std::io::{self, Write};

pub use config_cmd::ConfigCommand;
pub use food::FoodCommand;
pub use item::ItemCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Shorten `text` to `width` characters for table columns.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// Ask a yes/no question on stdin. Anything but `y` means no.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Oats", 10), "Oats");
        assert_eq!(truncate("Extra Virgin Olive Oil", 12), "Extra Vir...");
        assert_eq!(truncate("Crème fraîche", 8), "Crème...");
    }
}
