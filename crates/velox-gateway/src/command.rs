const CLEAR_COMMANDS: [&str; 2] = ["/clear", "/reset"];
const IMAGE_PREFIXES: [&str; 2] = ["/img", "/draw"];

/// What an inbound message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ClearMemory,
    GenerateImage(String),
    /// An image command with nothing to draw.
    ImageUsage,
    Chat(String),
}

/// Classify message text. Rules are checked in order and the first match wins.
pub fn classify(text: &str) -> Command {
    let text = text.trim();

    if CLEAR_COMMANDS.contains(&text) {
        return Command::ClearMemory;
    }

    for prefix in IMAGE_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            let prompt = rest.trim_start();
            return if prompt.is_empty() {
                Command::ImageUsage
            } else {
                Command::GenerateImage(prompt.to_string())
            };
        }
    }

    Command::Chat(text.to_string())
}
