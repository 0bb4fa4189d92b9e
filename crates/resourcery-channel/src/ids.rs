use chrono::Utc;

/// Identifier correlating one step invocation with its result file.
pub fn new_step_id() -> String {
    new_id("step")
}

/// Identifier correlating one pipeline run with its result file.
pub fn new_process_id() -> String {
    new_id("proc")
}

fn new_id(kind: &str) -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
    let short = short_id();
    format!("{kind}_{stamp}_{short}")
}

fn short_id() -> String {
    let id = uuid::Uuid::new_v4().to_string();
    match id.split('-').next() {
        Some(part) if !part.is_empty() => part.to_string(),
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_file_safe() {
        let first = new_step_id();
        let second = new_step_id();
        assert_ne!(first, second);
        assert!(first.starts_with("step_"));
        assert!(
            first
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        );
    }
}
