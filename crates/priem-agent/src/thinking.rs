//! Removal of `<think>...</think>` reasoning blocks from model output.
//!
//! Reasoning models served through Ollama or LM Studio inline their chain of
//! thought in the reply text. Users must only see what follows it.

const OPEN: &str = "<think>";
const CLOSE: &str = "</think>";

/// Strip every reasoning block, then trim surrounding whitespace.
///
/// Each opening marker pairs with the nearest following closing marker, and
/// the block may span lines. An opening marker with no closing marker after
/// it is left in place together with the rest of the text. Passes repeat
/// until no complete block remains, so `clean(clean(x)) == clean(x)`.
pub fn clean(raw: &str) -> String {
    let mut text = strip_once(raw);
    loop {
        let next = strip_once(&text);
        if next == text {
            break;
        }
        text = next;
    }
    text.trim().to_string()
}

fn strip_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after_open[end + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}
