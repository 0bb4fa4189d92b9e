use std::io;

/// Resolve a command-line JSON argument. `@path` reads the file at `path`;
/// anything else is taken literally.
pub fn read_input(value: &str) -> io::Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(value.to_string()),
    }
}
