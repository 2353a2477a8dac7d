use std::borrow::Cow;

/// The character to replace disallowed chars with
const TERMINAL_REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Replace control characters so receipt text cannot rewrite the terminal.
pub fn sanitize_terminal(input: &str) -> Cow<str> {
    if !input.chars().any(char::is_control) {
        return Cow::Borrowed(input);
    }
    Cow::Owned(
        input
            .chars()
            .map(|letter| {
                if letter.is_control() {
                    TERMINAL_REPLACEMENT_CHAR
                } else {
                    letter
                }
            })
            .collect(),
    )
}
