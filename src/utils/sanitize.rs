use ammonia;

/// Cleans user-supplied text (comments, tweets, titles) with the ammonia
/// whitelist sanitizer and trims surrounding whitespace.
///
/// Note: this strips <script> tags and their content entirely; markup a
/// client wants rendered verbatim must be entity-escaped on its side.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
