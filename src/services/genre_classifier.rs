use tracing::debug;

pub const DEFAULT_GENRE: &str = "Fiction";

/// Genre keyword table. Order matters: on equal counts the earlier genre keeps the lead.
const GENRE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Fantasy",
        &[
            "fantasy",
            "magic",
            "epic",
            "sword",
            "dragon",
            "wizard",
            "middle-earth",
            "thrones",
            "westeros",
            "mythical",
        ],
    ),
    (
        "Science Fiction",
        &[
            "science fiction",
            "sci-fi",
            "space",
            "future",
            "dystopian",
            "cyberpunk",
            "alien",
            "galaxy",
        ],
    ),
    (
        "Mystery",
        &[
            "mystery",
            "crime",
            "detective",
            "thriller",
            "suspense",
            "murder",
            "investigation",
        ],
    ),
    (
        "Romance",
        &[
            "romance",
            "love",
            "relationship",
            "contemporary romance",
            "historical romance",
        ],
    ),
    (
        "Horror",
        &[
            "horror",
            "ghost",
            "supernatural",
            "terror",
            "haunted",
            "zombie",
            "vampire",
        ],
    ),
    (
        "Biography",
        &["biography", "memoir", "autobiography", "life story"],
    ),
    (
        "History",
        &["history", "historical", "ancient", "medieval", "world war"],
    ),
    (
        "Science",
        &[
            "science",
            "technology",
            "physics",
            "biology",
            "chemistry",
            "mathematics",
        ],
    ),
    (
        "Self-Help",
        &[
            "self-help",
            "personal development",
            "motivational",
            "psychology",
        ],
    ),
    (
        "Young Adult",
        &["young adult", "ya", "teen", "adolescent", "coming of age"],
    ),
    ("Classic", &["classic", "literature", "classic literature"]),
];

/// Keyword-scoring classifier from provider category tags to one genre label.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenreClassifier;

impl GenreClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn genres(&self) -> impl Iterator<Item = &'static str> {
        GENRE_KEYWORDS.iter().map(|(genre, _)| *genre)
    }

    /// Picks the genre whose keywords appear most often (each keyword counted
    /// once) in the joined, lower-cased categories. Empty input, `["Unknown"]`,
    /// ties with the default and zero matches all give [`DEFAULT_GENRE`].
    pub fn detect_genre<S: AsRef<str>>(&self, categories: &[S]) -> &'static str {
        if categories.is_empty()
            || (categories.len() == 1 && categories[0].as_ref() == "Unknown")
        {
            return DEFAULT_GENRE;
        }

        let text = categories
            .iter()
            .map(|category| category.as_ref())
            .collect::<Vec<&str>>()
            .join(" ")
            .to_lowercase();

        let mut best = DEFAULT_GENRE;
        let mut max_matches = 0;
        for (genre, keywords) in GENRE_KEYWORDS {
            let matches = keywords
                .iter()
                .filter(|keyword| text.contains(*keyword))
                .count();
            if matches > max_matches {
                max_matches = matches;
                best = *genre;
            }
        }

        debug!("Detected genre '{}' ({} keyword hits) from '{}'", best, max_matches, text);
        best
    }
}
