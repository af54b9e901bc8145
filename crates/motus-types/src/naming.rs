//! Case conversion helpers shared by templates, codegen and the validator.

/// Split on anything that is not alphanumeric and on lower-to-upper boundaries.
fn words(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in input.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// `"Data Fetcher"` / `"dataFetcher"` -> `"data-fetcher"`.
pub fn kebab_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Uppercase the first character, leave the rest alone.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"budget-tracker"` -> `"BudgetTracker"`.
pub fn pascal_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| capitalize(&w.to_lowercase()))
        .collect()
}

/// `"budget-tracker"` -> `"budgetTracker"`.
pub fn camel_case(input: &str) -> String {
    let pascal = pascal_case(input);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"marketing-twitter"` -> `"MARKETING_TWITTER"`.
pub fn screaming_snake_case(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab() {
        assert_eq!(kebab_case("Data Fetcher"), "data-fetcher");
        assert_eq!(kebab_case("dataFetcher"), "data-fetcher");
        assert_eq!(kebab_case("  budget__tracker "), "budget-tracker");
    }

    #[test]
    fn pascal_and_camel() {
        assert_eq!(pascal_case("budget-tracker"), "BudgetTracker");
        assert_eq!(camel_case("budget-tracker"), "budgetTracker");
        assert_eq!(camel_case("google-analytics"), "googleAnalytics");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn capitalize_keeps_tail() {
        assert_eq!(capitalize("finance"), "Finance");
        assert_eq!(capitalize("oAuth"), "OAuth");
    }

    #[test]
    fn screaming_snake() {
        assert_eq!(screaming_snake_case("my-api.key"), "MY_API_KEY");
    }
}
