use colored::Colorize;
use reconcile::Action;
use std::fmt::Display;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// `id (verb): reason` for one failed mutation
pub fn failure_line(id: &str, action: Action, reason: impl Display) -> String {
    format!("{id} ({}): {reason}", action.verb())
}

/// Print one failed mutation to stderr
pub fn failure(id: &str, action: Action, reason: impl Display) {
    eprintln!("  {} {}", "✗".red(), failure_line(id, action, reason));
}

/// Comma-separated list for display, or `-` when empty
pub fn id_list(ids: &[String]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}
