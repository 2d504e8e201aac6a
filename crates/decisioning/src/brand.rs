//! Display brand names derived from campaign names, e.g.
//! "Capital One Venture - What's in Your Wallet?" -> "Capital One".

/// Multi-word brands, matched by prefix before anything else.
const MULTI_WORD_BRANDS: &[&str] = &[
    "American Express",
    "Under Armour",
    "Bank of America",
    "Capital One",
    "The New York Times",
    "The Wall Street Journal",
    "The Washington Post",
    "The Guardian",
    "Apple TV+",
    "Apple TV",
    "HBO Max",
    "Paramount+",
    "Paramount Plus",
    "Discovery+",
    "Discovery Plus",
    "YouTube Premium",
    "LinkedIn Learning",
    "Rosetta Stone",
    "Khan Academy",
];

/// Single brands; more specific variants precede their prefixes ("ESPN+" before "ESPN").
const SINGLE_BRANDS: &[&str] = &[
    "Nike", "Adidas", "Apple", "Samsung", "Chase", "Spotify", "Tesla", "Coursera",
    "Peloton", "Lululemon", "Gatorade", "Fitbit", "Reebok", "Puma", "Strava",
    "ESPN+", "ESPN", "Wilson", "Rawlings", "New Balance", "Mizuno",
    "Google", "Microsoft", "Meta", "Amazon", "Netflix", "Adobe",
    "PayPal", "Venmo", "Robinhood", "Fidelity", "Mastercard", "Visa",
    "Audible", "Hulu", "Peacock",
    "Comedy Central", "SiriusXM", "Pandora", "iHeartRadio",
    "CNN", "BBC", "Bloomberg", "Reuters", "NPR",
    "Udemy", "MasterClass", "Skillshare", "Duolingo", "Babbel", "edX",
];

/// Partial names that expand to a full brand when the campaign name carries it.
const NORMALIZATION: &[(&str, &str)] = &[
    ("American", "American Express"),
    ("Under", "Under Armour"),
    ("Bank", "Bank of America"),
    ("Capital", "Capital One"),
    ("The New York", "The New York Times"),
    ("The Wall Street", "The Wall Street Journal"),
    ("The Washington", "The Washington Post"),
    ("HBO", "HBO Max"),
    ("Paramount", "Paramount Plus"),
    ("Paramount+", "Paramount Plus"),
    ("Discovery", "Discovery Plus"),
    ("Discovery+", "Discovery Plus"),
    ("YouTube", "YouTube Premium"),
    ("LinkedIn", "LinkedIn Learning"),
    ("Rosetta", "Rosetta Stone"),
    ("Khan", "Khan Academy"),
];

fn known_prefix(campaign_name: &str) -> Option<&'static str> {
    MULTI_WORD_BRANDS
        .iter()
        .chain(SINGLE_BRANDS.iter())
        .find(|brand| campaign_name.starts_with(*brand))
        .copied()
}

fn normalize(brand: &str, campaign_name: &str) -> String {
    NORMALIZATION
        .iter()
        .find(|(partial, full)| *partial == brand && campaign_name.contains(full))
        .map(|(_, full)| (*full).to_string())
        .unwrap_or_else(|| brand.to_string())
}

/// Brand for a campaign name, or `None` when nothing usable can be extracted.
pub fn extract_brand_name(campaign_name: &str) -> Option<String> {
    let brand = match known_prefix(campaign_name) {
        Some(brand) => normalize(brand, campaign_name),
        None => normalize(campaign_name.split(' ').next()?, campaign_name),
    };
    (!brand.is_empty()).then_some(brand)
}

/// Brand name with a fallback for names that yield nothing.
pub fn brand_or(campaign_name: &str, fallback: &str) -> String {
    extract_brand_name(campaign_name).unwrap_or_else(|| fallback.to_string())
}
