//! Canonical trope vocabulary
//!
//! Seeds the canonicalizer's alias table and is embedded in model prompts so
//! the language-model sources prefer canonical names.

/// Canonical trope names
pub const CANONICAL_TROPES: [&str; 40] = [
    "Hero's Journey",
    "Chosen One",
    "Enemies to Lovers",
    "Dark Lord",
    "Prophecy",
    "Coming of Age",
    "Redemption Arc",
    "Found Family",
    "MacGuffin",
    "Love Triangle",
    "Magic System",
    "Mentor's Death",
    "Reluctant Hero",
    "Fish Out of Water",
    "Secret Identity",
    "Betrayal",
    "Revenge Quest",
    "Star-Crossed Lovers",
    "Underdog",
    "Training Montage",
    "Ancient Evil",
    "Lost Heir",
    "Hidden Kingdom",
    "Portal Fantasy",
    "Heist",
    "Tournament Arc",
    "Memory Loss",
    "Time Loop",
    "Parallel Worlds",
    "Dystopia",
    "Post-Apocalyptic",
    "Utopia Gone Wrong",
    "Forbidden Love",
    "Artificial Intelligence",
    "First Contact",
    "Space Opera",
    "Cosmic Horror",
    "Body Horror",
    "Gothic Horror",
    "Psychological Horror",
];

/// Built-in surface variants (variant, canonical name)
///
/// Variants are normalized before lookup, so casing and punctuation here are
/// irrelevant.
pub const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("monomyth", "Hero's Journey"),
    ("hero journey", "Hero's Journey"),
    ("the hero's journey", "Hero's Journey"),
    ("the chosen one", "Chosen One"),
    ("chosen hero", "Chosen One"),
    ("rivals to lovers", "Enemies to Lovers"),
    ("enemies-to-lovers romance", "Enemies to Lovers"),
    ("evil overlord", "Dark Lord"),
    ("prophesied hero", "Prophecy"),
    ("coming-of-age story", "Coming of Age"),
    ("bildungsroman", "Coming of Age"),
    ("redemption", "Redemption Arc"),
    ("chosen family", "Found Family"),
    ("plot device object", "MacGuffin"),
    ("death of the mentor", "Mentor's Death"),
    ("mentor dies", "Mentor's Death"),
    ("unwilling hero", "Reluctant Hero"),
    ("stranger in a strange land", "Fish Out of Water"),
    ("hidden identity", "Secret Identity"),
    ("double life", "Secret Identity"),
    ("traitor", "Betrayal"),
    ("quest for revenge", "Revenge Quest"),
    ("star crossed", "Star-Crossed Lovers"),
    ("doomed lovers", "Star-Crossed Lovers"),
    ("lost prince", "Lost Heir"),
    ("lost princess", "Lost Heir"),
    ("isekai", "Portal Fantasy"),
    ("portal to another world", "Portal Fantasy"),
    ("caper", "Heist"),
    ("amnesia", "Memory Loss"),
    ("groundhog day loop", "Time Loop"),
    ("alternate universe", "Parallel Worlds"),
    ("multiverse", "Parallel Worlds"),
    ("dystopian society", "Dystopia"),
    ("apocalypse", "Post-Apocalyptic"),
    ("false utopia", "Utopia Gone Wrong"),
    ("rogue ai", "Artificial Intelligence"),
    ("alien contact", "First Contact"),
    ("lovecraftian horror", "Cosmic Horror"),
];

/// Canonical names as a prompt bullet list
pub fn prompt_list() -> String {
    CANONICAL_TROPES
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n")
}
