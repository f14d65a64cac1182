pub mod activity;
pub mod lot;
pub mod trace;

use serde::Serialize;

/// Print a value to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the confirmation message of a mutation.
pub fn print_message(message: String) -> anyhow::Result<()> {
    print_json(&serde_json::json!({ "message": message }))
}
