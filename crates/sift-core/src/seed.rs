//! Built-in classification rule catalog
//!
//! Hand-tuned starting weights for common merchants and statement keywords,
//! grouped by category. The catalog is inserted once at initialization;
//! after that the feedback learner owns the weights. Catalog rules are never
//! deleted, only demoted.

use crate::models::{ExpenseType, NewRule, PatternKind};

/// A group of seed patterns sharing a class, kind, and starting weight
pub struct SeedGroup {
    pub slug: &'static str,
    pub type_label: ExpenseType,
    pub pattern_kind: PatternKind,
    pub weight: f64,
    pub patterns: &'static [&'static str],
}

pub(crate) const SEED_GROUPS: &[SeedGroup] = &[
    // ------------------------------------------------------------------
    // Fixed: recurring, predictable spend
    // ------------------------------------------------------------------
    SeedGroup {
        slug: "streaming",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "netflix",
            "spotify",
            "hulu",
            "disney plus",
            "hbo max",
            "paramount plus",
            "peacock tv",
            "apple tv",
            "apple music",
            "youtube premium",
            "deezer",
            "tidal",
            "crunchyroll",
            "audible",
            "kindle unlimited",
            "dazn",
            "canal plus",
            "prime video",
            "britbox",
            "mubi",
            "shudder",
            "curiositystream",
            "nebula",
            "viaplay",
            "hotstar",
            "stan",
            "crave",
            "funimation",
            "discovery plus",
            "amc plus",
        ],
    },
    SeedGroup {
        slug: "software-cloud",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "dropbox",
            "icloud",
            "google one",
            "onedrive",
            "adobe",
            "microsoft 365",
            "office 365",
            "github",
            "gitlab",
            "notion",
            "evernote",
            "slack",
            "zoom",
            "canva",
            "figma",
            "openai",
            "jetbrains",
            "backblaze",
            "protonmail",
            "fastmail",
            "squarespace",
            "wix",
            "godaddy",
            "namecheap",
            "cloudflare",
            "digitalocean",
            "nordvpn",
            "expressvpn",
            "1password",
            "lastpass",
        ],
    },
    SeedGroup {
        slug: "recurring-keywords",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.4,
        patterns: &[
            "subscription",
            "abonnement",
            "membership",
            "monthly plan",
            "recurring",
            "autopay",
            "auto pay",
            "renewal",
            "mensualite",
            "prelevement",
            "direct debit",
            "standing order",
        ],
    },
    SeedGroup {
        slug: "utilities",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.4,
        patterns: &[
            "electric",
            "electricity",
            "edf",
            "engie",
            "gas bill",
            "water bill",
            "veolia",
            "suez",
            "utility",
            "utilities",
            "hydro",
            "con edison",
            "pacific gas",
            "national grid",
            "british gas",
            "vattenfall",
            "total energies",
            "octopus energy",
            "dominion energy",
            "duke energy",
            "xcel energy",
            "southern california edison",
            "seattle city light",
            "waste management",
            "sewer",
        ],
    },
    SeedGroup {
        slug: "telecom",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "verizon",
            "t mobile",
            "att wireless",
            "vodafone",
            "orange",
            "sfr",
            "bouygues telecom",
            "free mobile",
            "o2",
            "comcast",
            "xfinity",
            "spectrum",
            "cox communications",
            "centurylink",
            "telstra",
            "rogers",
            "bell canada",
            "telus",
            "swisscom",
            "mint mobile",
            "cricket wireless",
            "boost mobile",
            "lycamobile",
            "lebara",
            "deutsche telekom",
        ],
    },
    SeedGroup {
        slug: "insurance",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.4,
        patterns: &[
            "insurance",
            "assurance",
            "geico",
            "allianz",
            "axa",
            "state farm",
            "progressive",
            "allstate",
            "maif",
            "macif",
            "matmut",
            "groupama",
            "generali",
            "aviva",
            "prudential",
            "metlife",
            "aetna",
            "cigna",
            "mutuelle",
            "liberty mutual",
            "usaa",
            "nationwide",
            "farmers insurance",
            "travelers",
            "the hartford",
        ],
    },
    SeedGroup {
        slug: "housing",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.4,
        patterns: &[
            "rent",
            "loyer",
            "mortgage",
            "landlord",
            "property management",
            "hoa dues",
            "condo fee",
            "escrow",
            "lease payment",
            "real estate taxes",
            "housing association",
            "syndic",
        ],
    },
    SeedGroup {
        slug: "loans",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "loan payment",
            "student loan",
            "auto loan",
            "car payment",
            "installment",
            "sallie mae",
            "navient",
            "sofi",
            "klarna",
            "affirm",
            "afterpay",
            "credit builder",
        ],
    },
    SeedGroup {
        slug: "fitness",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "gym",
            "basic fit",
            "planet fitness",
            "anytime fitness",
            "la fitness",
            "equinox",
            "crossfit",
            "peloton",
            "strava",
            "classpass",
            "yoga studio",
            "pilates studio",
            "orangetheory",
            "gold s gym",
        ],
    },
    SeedGroup {
        slug: "education-subs",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "tuition",
            "udemy",
            "coursera",
            "skillshare",
            "masterclass",
            "duolingo",
            "babbel",
            "chegg",
            "scribd",
            "patreon",
            "substack",
            "medium membership",
        ],
    },
    SeedGroup {
        slug: "childcare",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "daycare",
            "childcare",
            "nursery fees",
            "creche",
            "after school club",
            "au pair",
        ],
    },
    SeedGroup {
        slug: "news",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "new york times",
            "washington post",
            "the guardian",
            "le monde",
            "the economist",
            "wall street journal",
            "financial times",
            "bloomberg",
            "the athletic",
            "wired",
            "national geographic",
            "mediapart",
        ],
    },
    SeedGroup {
        slug: "fixed-merchants",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::MerchantExact,
        weight: 0.3,
        patterns: &[
            "netflix com",
            "spotify usa",
            "spotify ab",
            "hulu 877 8248584",
            "disney plus",
            "adobe systems",
            "dropbox inc",
            "apple com bill",
            "google storage",
            "amazon prime",
            "microsoft 365",
            "audible inc",
            "att payment",
            "verizon wrls",
            "geico auto",
            "state farm insurance",
            "planet fit club fees",
            "youtube premium g co",
            "icloud storage",
            "hbo max billing",
        ],
    },
    SeedGroup {
        slug: "fixed-merchants-fuzzy",
        type_label: ExpenseType::Fixed,
        pattern_kind: PatternKind::MerchantFuzzy,
        weight: 0.3,
        patterns: &[
            "netflix com bill",
            "spotify usa 877 7781161",
            "apple com bill cupertino",
            "google one storage plan",
            "adobe creative cloud",
            "microsoft 365 family",
            "hbo max 0423",
            "disney plus annual",
            "at t payment pymt",
            "verizon wireless payment",
            "comcast cable comm",
            "state farm ro 27",
            "geico insurance co",
            "planet fitness club fees",
            "amazon prime membership",
        ],
    },
    // ------------------------------------------------------------------
    // Variable: occasional, discretionary spend
    // ------------------------------------------------------------------
    SeedGroup {
        slug: "dining",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "restaurant",
            "cafe",
            "coffee",
            "starbucks",
            "mcdonald",
            "burger king",
            "kfc",
            "subway",
            "chipotle",
            "taco bell",
            "pizza",
            "domino",
            "papa john",
            "wendy",
            "dunkin",
            "bakery",
            "boulangerie",
            "brasserie",
            "bistro",
            "sushi",
            "kebab",
            "food truck",
            "diner",
            "steakhouse",
            "pub",
            "five guys",
            "shake shack",
            "panera",
            "olive garden",
            "applebee",
            "ihop",
            "waffle house",
            "popeyes",
            "chick fil a",
            "panda express",
        ],
    },
    SeedGroup {
        slug: "delivery",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "uber eats",
            "doordash",
            "grubhub",
            "deliveroo",
            "just eat",
            "postmates",
            "instacart",
            "seamless",
            "gopuff",
            "wolt",
        ],
    },
    SeedGroup {
        slug: "groceries",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "grocery",
            "supermarket",
            "walmart",
            "target",
            "costco",
            "kroger",
            "safeway",
            "aldi",
            "lidl",
            "carrefour",
            "auchan",
            "leclerc",
            "intermarche",
            "monoprix",
            "whole foods",
            "trader joe",
            "publix",
            "wegmans",
            "tesco",
            "sainsbury",
            "waitrose",
            "albert heijn",
            "franprix",
            "picard",
            "meijer",
            "h e b",
            "food lion",
            "giant eagle",
            "stop and shop",
            "winn dixie",
            "sprouts",
            "morrisons",
            "asda",
            "spar",
            "casino shop",
        ],
    },
    SeedGroup {
        slug: "shopping",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "ebay",
            "etsy",
            "zara",
            "h m",
            "uniqlo",
            "nike",
            "adidas",
            "sephora",
            "ikea",
            "best buy",
            "home depot",
            "lowes",
            "macy",
            "nordstrom",
            "tj maxx",
            "ross stores",
            "zalando",
            "asos",
            "shein",
            "temu",
            "aliexpress",
            "fnac",
            "darty",
            "decathlon",
            "wayfair",
            "overstock",
            "old navy",
            "banana republic",
            "primark",
            "mango",
            "bershka",
            "marshalls",
            "dollar general",
            "dollar tree",
            "five below",
        ],
    },
    SeedGroup {
        slug: "entertainment",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "cinema",
            "movie",
            "amc theatres",
            "regal cinemas",
            "ugc cine",
            "pathe",
            "concert",
            "ticketmaster",
            "stubhub",
            "eventbrite",
            "bowling",
            "arcade",
            "museum",
            "theme park",
            "zoo",
            "aquarium",
        ],
    },
    SeedGroup {
        slug: "travel",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.35,
        patterns: &[
            "airline",
            "airways",
            "delta air",
            "united air",
            "american air",
            "southwest",
            "ryanair",
            "easyjet",
            "air france",
            "lufthansa",
            "british airways",
            "klm",
            "jetblue",
            "alaska air",
            "spirit air",
            "frontier air",
            "emirates",
            "hotel",
            "marriott",
            "hilton",
            "hyatt",
            "airbnb",
            "booking com",
            "expedia",
            "hostel",
            "motel",
            "vrbo",
            "kayak",
            "travelocity",
            "norwegian air",
        ],
    },
    SeedGroup {
        slug: "transport-fuel",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "uber trip",
            "lyft",
            "taxi",
            "shell",
            "chevron",
            "texaco",
            "mobil",
            "esso",
            "sunoco",
            "valero",
            "speedway",
            "circle k",
            "wawa",
            "pilot travel",
            "loves travel",
            "gas station",
            "parking",
            "toll",
            "car wash",
            "hertz",
            "avis",
            "enterprise rent",
            "budget rent",
            "zipcar",
            "bolt ride",
        ],
    },
    SeedGroup {
        slug: "bars",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "bar",
            "brewery",
            "liquor",
            "bottle shop",
            "cocktail",
            "nightclub",
            "taproom",
            "wine bar",
        ],
    },
    SeedGroup {
        slug: "personal-care",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.25,
        patterns: &[
            "salon",
            "barber",
            "spa",
            "nails",
            "massage",
            "coiffeur",
            "waxing",
            "tanning",
        ],
    },
    SeedGroup {
        slug: "healthcare-visits",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "pharmacy",
            "pharmacie",
            "dentist",
            "clinic",
            "hospital",
            "veterinary",
            "optician",
            "urgent care",
            "chiropractor",
            "physical therapy",
        ],
    },
    SeedGroup {
        slug: "pets",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "petco",
            "petsmart",
            "pet store",
            "grooming",
            "kennel",
            "pet supplies",
        ],
    },
    SeedGroup {
        slug: "games-oneoff",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "gamestop",
            "steam games",
            "nintendo eshop",
            "epic games",
            "itch io",
            "humble bundle",
        ],
    },
    SeedGroup {
        slug: "home-improvement",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "ace hardware",
            "menards",
            "b and q",
            "leroy merlin",
            "screwfix",
            "hardware store",
            "garden center",
        ],
    },
    SeedGroup {
        slug: "cash",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "atm withdrawal",
            "cash withdrawal",
            "western union",
            "moneygram",
            "cash app",
        ],
    },
    SeedGroup {
        slug: "gifts-misc",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::Keyword,
        weight: 0.3,
        patterns: &[
            "gift shop",
            "florist",
            "toy store",
            "bookstore",
            "souvenir",
            "card shop",
            "party supplies",
        ],
    },
    SeedGroup {
        slug: "variable-merchants",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::MerchantExact,
        weight: 0.3,
        patterns: &[
            "mcdonalds",
            "starbucks coffee",
            "uber trip help uber com",
            "lyft ride",
            "amazon mktp us",
            "walmart supercenter",
            "target store",
            "costco whse",
            "shell oil",
            "chevron gas",
            "7 eleven",
            "cvs pharmacy",
            "walgreens",
            "home depot store",
            "ikea store",
            "trader joes",
        ],
    },
    SeedGroup {
        slug: "variable-merchants-fuzzy",
        type_label: ExpenseType::Variable,
        pattern_kind: PatternKind::MerchantFuzzy,
        weight: 0.3,
        patterns: &[
            "mcdonalds restaurant",
            "starbucks store 0123",
            "amazon marketplace payments",
            "uber trip help",
            "doordash order",
            "walmart grocery pickup",
            "target t 1234",
            "costco wholesale 123",
            "shell service station",
            "chevron station",
        ],
    },
];

/// All catalog rules in insertion order
pub fn catalog() -> Vec<NewRule> {
    SEED_GROUPS
        .iter()
        .flat_map(|group| {
            group.patterns.iter().map(move |pattern| NewRule {
                name: format!("{}: {}", group.slug, pattern),
                type_label: group.type_label,
                pattern_kind: group.pattern_kind,
                pattern: (*pattern).to_string(),
                weight: group.weight,
            })
        })
        .collect()
}
