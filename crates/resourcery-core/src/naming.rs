//! Naming conventions shared by every generated artifact.

use convert_case::{Case, Casing};

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("loaf", "loaves"),
    ("thief", "thieves"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "deer",
    "equipment",
    "fish",
    "information",
    "news",
    "series",
    "sheep",
    "species",
];

/// Words ending in `o` that take `es`.
const O_ES: &[&str] = &[
    "buffalo", "echo", "hero", "potato", "tomato", "torpedo", "veto", "volcano",
];

/// `BlogPost` -> `blog_post`.
pub fn snake(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// `BlogPost` -> `blogPost`.
pub fn camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

/// English plural of the last word in `word`, preserving everything before
/// it. Words are split on `_` and on an inner uppercase letter.
pub fn plural(word: &str) -> String {
    let start = last_word_start(word);
    let (stem, last) = word.split_at(start);
    let lower = last.to_ascii_lowercase();
    let pluralized = plural_word(&lower);
    let capitalized = last.starts_with(|ch: char| ch.is_ascii_uppercase());
    if capitalized {
        let mut chars = pluralized.chars();
        match chars.next() {
            Some(first) => format!("{stem}{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => word.to_string(),
        }
    } else {
        format!("{stem}{pluralized}")
    }
}

fn last_word_start(word: &str) -> usize {
    let underscore = word.rfind('_').map(|index| index + 1).unwrap_or(0);
    let upper = word
        .char_indices()
        .skip(1)
        .filter(|(_, ch)| ch.is_ascii_uppercase())
        .map(|(index, _)| index)
        .last()
        .unwrap_or(0);
    underscore.max(upper)
}

fn plural_word(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }
    if O_ES.contains(&word) {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix("is") {
        return format!("{stem}es");
    }
    if let Some(stem) = word.strip_suffix("fe") {
        if !stem.ends_with('f') {
            return format!("{stem}ves");
        }
    }
    if word.ends_with("lf") || word.ends_with("rf") {
        return format!("{}ves", &word[..word.len() - 1]);
    }

    let mut chars = word.chars().rev();
    let last = chars.next();
    let before_last = chars.next();
    match (before_last, last) {
        (Some(prev), Some('y')) if !is_vowel(prev) => format!("{}ies", &word[..word.len() - 1]),
        _ if word.ends_with('s')
            || word.ends_with('x')
            || word.ends_with('z')
            || word.ends_with("sh")
            || word.ends_with("ch") =>
        {
            format!("{word}es")
        }
        _ => format!("{word}s"),
    }
}

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Storage table for an entity: `BlogPost` -> `blog_posts`.
pub fn table_name(entity: &str) -> String {
    plural(&snake(entity))
}

/// Lowercased plural used in prose: `BlogPost` -> `blogposts`.
pub fn prose_plural(entity: &str) -> String {
    plural(&entity.to_lowercase())
}

/// Display label for a column: `is_featured` -> `Is Featured`.
pub fn label(field_name: &str) -> String {
    field_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

/// True for identifiers starting with an uppercase ASCII letter.
pub fn is_pascal_identifier(value: &str) -> bool {
    is_identifier(value) && value.starts_with(|ch: char| ch.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_rules() {
        assert_eq!(plural("post"), "posts");
        assert_eq!(plural("category"), "categories");
        assert_eq!(plural("day"), "days");
        assert_eq!(plural("box"), "boxes");
        assert_eq!(plural("branch"), "branches");
        assert_eq!(plural("sales_person"), "sales_people");
        assert_eq!(plural("hero"), "heroes");
        assert_eq!(plural("photo"), "photos");
        assert_eq!(plural("leaf"), "leaves");
        assert_eq!(plural("knife"), "knives");
        assert_eq!(plural("shelf"), "shelves");
        assert_eq!(plural("roof"), "roofs");
        assert_eq!(plural("analysis"), "analyses");
        assert_eq!(plural("sheep"), "sheep");
    }

    #[test]
    fn irregulars_match_whole_words_only() {
        assert_eq!(plural("human"), "humans");
        assert_eq!(plural("shaman"), "shamans");
        assert_eq!(plural("sales_man"), "sales_men");
        assert_eq!(plural("SalesPerson"), "SalesPeople");
        assert_eq!(plural("BlogPost"), "BlogPosts");
        assert_eq!(plural("Category"), "Categories");
    }

    #[test]
    fn table_names() {
        assert_eq!(table_name("Post"), "posts");
        assert_eq!(table_name("BlogPost"), "blog_posts");
        assert_eq!(table_name("Category"), "categories");
        assert_eq!(table_name("Human"), "humans");
        assert_eq!(table_name("Hero"), "heroes");
        assert_eq!(table_name("Leaf"), "leaves");
        assert_eq!(table_name("Analysis"), "analyses");
        assert_eq!(table_name("Shaman"), "shamans");
        assert_eq!(table_name("ProductCategory"), "product_categories");
    }

    #[test]
    fn labels_title_case_each_word() {
        assert_eq!(label("is_featured"), "Is Featured");
        assert_eq!(label("title"), "Title");
    }
}
