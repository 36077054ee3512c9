/// Tokenize a command into words using shlex (POSIX word splitting).
pub fn tokenize(command: &str) -> Vec<String> {
    shlex::split(command).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        command.split_whitespace().map(String::from).collect()
    })
}

/// Strip surrounding single/double quotes left over by the whitespace fallback.
pub fn trim_quotes(word: &str) -> &str {
    word.trim_matches(|c| c == '\'' || c == '"')
}

/// Collect the values given to any of `flags`, in command order.
///
/// Handles both `--flag value` and `--flag=value`. The `=` form is only
/// recognized for long flags, so `-n=x` stays a single opaque word.
pub fn flag_values(words: &[String], flags: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = words.iter().peekable();
    while let Some(word) = iter.next() {
        if flags.iter().any(|f| f == word) {
            if let Some(value) = iter.next() {
                values.push(trim_quotes(value).to_string());
            }
            continue;
        }
        if let Some((name, value)) = word.split_once('=')
            && name.starts_with("--")
            && flags.iter().any(|f| f == name)
        {
            values.push(trim_quotes(value).to_string());
        }
    }
    values
}

/// Last path segment, splitting on either separator.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
