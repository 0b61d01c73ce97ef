//! Fixed content catalogs: the relationship question prompts and the mood
//! options offered by check-ins.

/// Mood choices for a daily check-in.
pub const MOOD_OPTIONS: &[&str] = &["😊", "😍", "😢", "😴", "😤", "🤗", "🥰", "😔"];

/// One of the predefined question prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub id: &'static str,
    pub question: &'static str,
    pub category: &'static str,
}

/// The fixed prompt catalog, in display order.
pub const PROMPTS: &[Prompt] = &[
    Prompt {
        id: "1",
        question: "What's your favorite memory of us?",
        category: "Memories",
    },
    Prompt {
        id: "2",
        question: "What made you fall in love with me?",
        category: "Love",
    },
    Prompt {
        id: "3",
        question: "Where do you see us in 5 years?",
        category: "Future",
    },
    Prompt {
        id: "4",
        question: "What's one thing I do that makes you smile?",
        category: "Happiness",
    },
    Prompt {
        id: "5",
        question: "What's your dream date with me?",
        category: "Romance",
    },
    Prompt {
        id: "6",
        question: "What's something new you'd like to try together?",
        category: "Adventure",
    },
    Prompt {
        id: "7",
        question: "What song reminds you of us?",
        category: "Music",
    },
    Prompt {
        id: "8",
        question: "What's your favorite thing about our relationship?",
        category: "Love",
    },
    Prompt {
        id: "9",
        question: "How do you want me to show you love?",
        category: "Love Languages",
    },
    Prompt {
        id: "10",
        question: "What's a small thing I do that means a lot to you?",
        category: "Appreciation",
    },
];

/// Look up a prompt by its id.
pub fn prompt_by_id(id: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ids_unique() {
        for (i, a) in PROMPTS.iter().enumerate() {
            for b in &PROMPTS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_prompt_lookup() {
        assert_eq!(prompt_by_id("7").map(|p| p.category), Some("Music"));
        assert!(prompt_by_id("99").is_none());
    }
}
