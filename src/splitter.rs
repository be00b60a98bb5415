/// Split a comma-delimited expression string into its top-level parts.
///
/// Commas inside `'`, `"` or `` ` `` quotes and inside `()`, `[]` or `{}`
/// bracket pairs are not split points. Quotes honor both backslash escapes
/// and doubled-quote escapes; a closing bracket that matches nothing is
/// passed through as a literal; an unterminated quote or bracket swallows
/// the rest of the input as one literal tail. Parts are trimmed and empty
/// parts are dropped.
///
/// # Examples
///
/// ```rust
/// use sift::split_expressions;
///
/// assert_eq!(
///     vec!["COUNT(x) desc", "SUM(y) asc"],
///     split_expressions("COUNT(x) desc, SUM(y) asc")
/// );
/// assert_eq!(
///     vec!["name = 'John, Doe'", "age > 25"],
///     split_expressions("name = 'John, Doe', age > 25")
/// );
/// ```
pub fn split_expressions(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut brackets: Vec<char> = Vec::new();
    let mut characters = input.chars().peekable();

    while let Some(character) = characters.next() {
        if let Some(quote_character) = quote {
            current.push(character);
            if escaped {
                escaped = false;
                continue;
            }
            if character == '\\' {
                escaped = true;
                continue;
            }
            if character == quote_character {
                // A doubled quote of the same type stays inside the quote.
                if characters.peek() == Some(&quote_character) {
                    current.push(quote_character);
                    characters.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }

        match character {
            '\'' | '"' | '`' => {
                quote = Some(character);
                current.push(character);
            }
            '(' | '[' | '{' => {
                brackets.push(character);
                current.push(character);
            }
            ')' | ']' | '}' => {
                if brackets.last().copied() == Some(opening_of(character)) {
                    brackets.pop();
                }
                current.push(character);
            }
            ',' if brackets.is_empty() => {
                flush(&mut parts, &mut current);
            }
            other => current.push(other),
        }
    }
    flush(&mut parts, &mut current);
    parts
}

fn opening_of(closing: char) -> char {
    match closing {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn flush(parts: &mut Vec<String>, current: &mut String) {
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_owned());
    }
    current.clear();
}
