//! Static ingredient keyword tables backing the constraint filter.
//!
//! Matching is a lower-cased substring search over ingredient names. That is a known source
//! of false positives ("butternut squash" contains "butter", "eggplant" contains "egg") and
//! false negatives (brand names, misspellings). Keywords that collide with common plant
//! ingredients ("lard" in "collard", "rum" in "drumstick") are left out on purpose. The
//! tables stay explicit so every rule is reviewable and testable; extend them rather than
//! layering fuzzy matching on top.

const FISH: &[&str] = &[
    "salmon",
    "tuna",
    "cod",
    "anchovy",
    "sardine",
    "tilapia",
    "halibut",
    "trout",
    "mackerel",
    "haddock",
    "fish",
];

const SHELLFISH: &[&str] = &[
    "shellfish",
    "shrimp",
    "prawn",
    "crab",
    "lobster",
    "clam",
    "mussel",
    "oyster",
    "scallop",
    "crayfish",
    "squid",
    "octopus",
];

const PORK: &[&str] = &[
    "pork",
    "bacon",
    "ham",
    "prosciutto",
    "guanciale",
    "pancetta",
    "chorizo",
    "pepperoni",
    "salami",
];

const BEEF: &[&str] = &["beef", "steak", "veal", "brisket", "oxtail"];

const OTHER_MEAT: &[&str] = &[
    "chicken", "turkey", "lamb", "duck", "goat meat", "venison", "sausage", "mutton",
    "rabbit", "gelatin",
];

const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "whey", "casein", "ghee",
    "parmesan", "mozzarella", "feta",
];

const EGG: &[&str] = &["egg", "mayonnaise", "meringue", "albumin"];

const GLUTEN: &[&str] = &[
    "wheat",
    "barley",
    "rye",
    "flour",
    "bread",
    "pasta",
    "couscous",
    "semolina",
    "seitan",
    "spelt",
    "noodle",
    "soy sauce",
];

const ALCOHOL: &[&str] = &[
    "wine", "beer", "vodka", "whiskey", "brandy", "sake", "mirin", "liqueur", "bourbon",
];

const OTHER_ANIMAL_PRODUCTS: &[&str] = &["honey", "anchovy paste", "fish sauce"];

const PEANUT: &[&str] = &["peanut", "groundnut", "satay"];

const TREE_NUT: &[&str] = &[
    "almond",
    "cashew",
    "walnut",
    "pecan",
    "pistachio",
    "hazelnut",
    "macadamia",
    "brazil nut",
    "pine nut",
];

const SOY: &[&str] = &["soy", "tofu", "tempeh", "edamame", "miso"];

const SESAME: &[&str] = &["sesame", "tahini"];

const LACTOSE: &[&str] = &["milk", "cheese", "cream", "yogurt", "yoghurt", "ice cream", "whey"];

const FRUCTOSE: &[&str] = &["honey", "agave", "apple", "pear", "mango", "high fructose"];

const HISTAMINE: &[&str] = &[
    "aged cheese",
    "salami",
    "sauerkraut",
    "kimchi",
    "wine",
    "vinegar",
    "smoked",
];

const FODMAP: &[&str] = &["onion", "garlic", "lentil", "chickpea", "bean", "apple", "wheat"];

const CAFFEINE: &[&str] = &["coffee", "espresso", "matcha", "black tea", "cocoa"];

/// Collapses allergy aliases (`peanuts`, `milk`, `eggs`, ...) onto one normalized name.
pub fn canonical_allergen(name: &str) -> &str {
    match name {
        "peanut" | "peanuts" => "peanut",
        "tree_nut" | "tree_nuts" | "nut" | "nuts" => "tree_nut",
        "dairy" | "milk" => "dairy",
        "egg" | "eggs" => "egg",
        "shellfish" | "crustacean" | "crustaceans" => "shellfish",
        "soy" | "soya" | "soybean" | "soybeans" => "soy",
        "wheat" | "gluten" => "wheat",
        other => other,
    }
}

/// Keywords for a normalized allergy name; empty when the allergy has no table entry.
pub fn allergy_keywords(allergy: &str) -> Vec<&'static str> {
    let tables: &[&[&str]] = match canonical_allergen(allergy) {
        "peanut" => &[PEANUT],
        "tree_nut" => &[TREE_NUT],
        "dairy" => &[DAIRY],
        "egg" => &[EGG],
        "fish" => &[FISH],
        "shellfish" => &[SHELLFISH],
        "soy" => &[SOY],
        "wheat" => &[GLUTEN],
        "sesame" => &[SESAME],
        _ => &[],
    };
    flatten(tables)
}

pub fn intolerance_keywords(intolerance: &str) -> Vec<&'static str> {
    let tables: &[&[&str]] = match intolerance {
        "lactose" | "dairy" => &[LACTOSE],
        "gluten" | "wheat" => &[GLUTEN],
        "fructose" => &[FRUCTOSE],
        "histamine" => &[HISTAMINE],
        "fodmap" | "fodmaps" => &[FODMAP],
        "caffeine" => &[CAFFEINE],
        _ => &[],
    };
    flatten(tables)
}

pub fn animal_product_keywords() -> Vec<&'static str> {
    flatten(&[
        FISH,
        SHELLFISH,
        PORK,
        BEEF,
        OTHER_MEAT,
        DAIRY,
        EGG,
        OTHER_ANIMAL_PRODUCTS,
    ])
}

pub fn meat_keywords() -> Vec<&'static str> {
    flatten(&[FISH, SHELLFISH, PORK, BEEF, OTHER_MEAT, &["fish sauce"]])
}

pub fn non_fish_meat_keywords() -> Vec<&'static str> {
    flatten(&[PORK, BEEF, OTHER_MEAT])
}

pub fn gluten_keywords() -> Vec<&'static str> {
    GLUTEN.to_vec()
}

pub fn dairy_keywords() -> Vec<&'static str> {
    DAIRY.to_vec()
}

pub fn halal_forbidden_keywords() -> Vec<&'static str> {
    flatten(&[PORK, ALCOHOL, &["gelatin", "alcohol"]])
}

pub fn kosher_forbidden_keywords() -> Vec<&'static str> {
    flatten(&[PORK, SHELLFISH, &["catfish", "unagi", "rabbit", "gelatin"]])
}

pub fn pork_keywords() -> Vec<&'static str> {
    PORK.to_vec()
}

pub fn beef_keywords() -> Vec<&'static str> {
    BEEF.to_vec()
}

pub fn shellfish_keywords() -> Vec<&'static str> {
    SHELLFISH.to_vec()
}

pub fn alcohol_keywords() -> Vec<&'static str> {
    flatten(&[ALCOHOL, &["alcohol"]])
}

/// Salt-like ingredients paired with a generic lower-sodium alternative.
pub const SODIUM_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("soy sauce", "low-sodium soy sauce or coconut aminos"),
    ("fish sauce", "reduced-sodium fish sauce"),
    ("bouillon", "low-sodium broth"),
    ("stock cube", "low-sodium broth"),
    ("miso", "reduced-sodium miso"),
    ("salt", "herb and citrus seasoning"),
];

pub fn sodium_substitute_for(ingredient: &str) -> Option<&'static str> {
    let lowered = ingredient.to_lowercase();
    SODIUM_SUBSTITUTIONS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, alternative)| *alternative)
}

/// Returns the first ingredient that contains any of the keywords.
pub fn first_match<'a>(ingredients: &'a [String], keywords: &[&str]) -> Option<&'a str> {
    ingredients.iter().map(String::as_str).find(|ingredient| {
        let lowered = ingredient.to_lowercase();
        keywords.iter().any(|keyword| lowered.contains(keyword))
    })
}

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase().replace([' ', '-'], "_")
}

fn flatten(tables: &[&[&'static str]]) -> Vec<&'static str> {
    tables.iter().flat_map(|table| table.iter().copied()).collect()
}
