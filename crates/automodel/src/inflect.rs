//! English inflection helpers.
//!
//! Relationship accessors and class names are derived from table names, so
//! pluralize/singularize have to agree with each other: for regular nouns the
//! two functions are inverses, and irregular nouns go through an exception
//! table covering both directions.
//!
//! One known gap: singulars ending in `-se` (house, case, phrase) pluralize to
//! `-ses`, which [`singularize`] reads as an `s`-stem plural and strips back
//! to `hous`. Such nouns need an entry in the exception table to round-trip.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Irregular nouns, singular -> plural.
const IRREGULAR: &[(&str, &str)] = &[
    // us => i
    ("alumnus", "alumni"),
    ("cactus", "cacti"),
    ("focus", "foci"),
    ("fungus", "fungi"),
    ("nucleus", "nuclei"),
    ("radius", "radii"),
    ("stimulus", "stimuli"),
    ("syllabus", "syllabi"),
    // is => es
    ("axis", "axes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("diagnosis", "diagnoses"),
    ("ellipsis", "ellipses"),
    ("hypothesis", "hypotheses"),
    ("oasis", "oases"),
    ("paralysis", "paralyses"),
    ("parenthesis", "parentheses"),
    ("synthesis", "syntheses"),
    ("synopsis", "synopses"),
    ("thesis", "theses"),
    // ix => ices
    ("appendix", "appendices"),
    ("index", "indices"),
    ("matrix", "matrices"),
    // eau => eaux
    ("beau", "beaux"),
    ("bureau", "bureaux"),
    ("tableau", "tableaux"),
    // => en
    ("child", "children"),
    ("man", "men"),
    ("ox", "oxen"),
    ("woman", "women"),
    // => a
    ("bacterium", "bacteria"),
    ("corpus", "corpora"),
    ("criterion", "criteria"),
    ("curriculum", "curricula"),
    ("datum", "data"),
    ("genus", "genera"),
    ("medium", "media"),
    ("memorandum", "memoranda"),
    ("phenomenon", "phenomena"),
    ("stratum", "strata"),
    // oo => ee
    ("foot", "feet"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    // a => ae
    ("antenna", "antennae"),
    ("formula", "formulae"),
    ("nebula", "nebulae"),
    ("vertebra", "vertebrae"),
    ("vita", "vitae"),
    // ouse => ice
    ("louse", "lice"),
    ("mouse", "mice"),
    // f/fe => ves
    ("leaf", "leaves"),
    ("half", "halves"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("life", "lives"),
    ("elf", "elves"),
    ("loaf", "loaves"),
    // o => oes
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
];

/// Nouns whose plural equals the singular.
const UNCHANGED: &[&str] = &[
    "bison",
    "cod",
    "deer",
    "fish",
    "information",
    "means",
    "news",
    "offspring",
    "pike",
    "salmon",
    "series",
    "sheep",
    "shrimp",
    "species",
    "swine",
    "trout",
];

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

fn is_unchanged(word: &str) -> bool {
    // `*craft` compounds (aircraft, spacecraft, ...) never vary either.
    UNCHANGED.contains(&word) || word.ends_with("craft")
}

/// Convert a singular noun to its plural form.
pub fn pluralize(name: &str) -> String {
    let word = name.to_lowercase();

    if is_unchanged(&word) {
        return word;
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == word) {
        return (*plural).to_string();
    }

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.chars().next_back().is_some_and(|c| VOWELS.contains(&c)) {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}

/// Convert a plural noun to its singular form.
pub fn singularize(name: &str) -> String {
    let word = name.to_lowercase();

    if is_unchanged(&word) {
        return word;
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, p)| *p == word) {
        return (*singular).to_string();
    }

    // Also matches `-se` singulars pluralized to `-ses` (houses -> hous);
    // see the module doc.
    if word.ends_with("ses")
        || word.ends_with("xes")
        || word.ends_with("zes")
        || word.ends_with("ches")
        || word.ends_with("shes")
    {
        return word[..word.len() - 2].to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.chars().next_back().is_some_and(|c| VOWELS.contains(&c)) {
            return format!("{stem}y");
        }
    }

    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }

    word
}

/// Derive a model class name from a table name: the last word is singularized
/// and the whole name goes UpperCamelCase (`user_accounts` -> `UserAccount`).
pub fn table_to_class(table: &str) -> String {
    let mut words: Vec<String> = table
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect();

    if let Some(last) = words.last_mut() {
        *last = singularize(last);
    }

    words.join("_").to_upper_camel_case()
}

/// Derive a relationship accessor name from a class name.
///
/// Singular accessors are the snake_case class name; plural ones pluralize
/// the final word (`UserAccount` -> `user_account` / `user_accounts`).
pub fn accessor_name(class: &str, plural: bool) -> String {
    let snake = class.to_snake_case();
    if !plural {
        return snake;
    }

    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{head}_{}", pluralize(last)),
        None => pluralize(&snake),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_nouns_round_trip() {
        for word in ["user", "account", "post", "box", "quiz", "branch", "dish", "city", "day"] {
            let plural = pluralize(word);
            assert_eq!(singularize(&plural), word, "round trip for {word}");
        }

        assert_eq!(pluralize("city"), "cities");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("dishes"), "dish");
    }

    #[test]
    fn se_endings_do_not_round_trip_without_an_exception() {
        // The documented gap from the module doc.
        assert_eq!(pluralize("house"), "houses");
        assert_eq!(singularize("houses"), "hous");
    }

    #[test]
    fn irregular_table_covers_both_directions() {
        for (singular, plural) in IRREGULAR {
            assert_eq!(pluralize(singular), *plural, "pluralize {singular}");
            assert_eq!(singularize(plural), *singular, "singularize {plural}");
        }
    }

    #[test]
    fn unchanged_nouns_stay_put() {
        for word in UNCHANGED {
            assert_eq!(pluralize(word), *word);
            assert_eq!(singularize(word), *word);
        }
        assert_eq!(pluralize("aircraft"), "aircraft");
        assert_eq!(singularize("aircraft"), "aircraft");
    }

    #[test]
    fn table_to_class_singularizes_last_word() {
        assert_eq!(table_to_class("users"), "User");
        assert_eq!(table_to_class("user_accounts"), "UserAccount");
        assert_eq!(table_to_class("people_categories"), "PeopleCategory");
    }

    #[test]
    fn accessor_names() {
        assert_eq!(accessor_name("User", false), "user");
        assert_eq!(accessor_name("User", true), "users");
        assert_eq!(accessor_name("UserAccount", true), "user_accounts");
        assert_eq!(accessor_name("UserAccount", false), "user_account");
    }
}
