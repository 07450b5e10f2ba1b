use rand::Rng;
use rand::seq::SliceRandom;

/// A named shelf of preset fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LibraryCategory {
    pub name: &'static str,
    pub fragments: &'static [&'static str],
}

impl LibraryCategory {
    /// Up to `count` distinct fragments from this shelf, in random order.
    pub fn pick<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&'static str> {
        self.fragments.choose_multiple(rng, count).copied().collect()
    }
}

pub const LIBRARY: &[LibraryCategory] = &[
    LibraryCategory {
        name: "Sandwiches & Food",
        fragments: &[
            "Bread is architecture. The crust is load-bearing; the crumb is insulation.",
            "A bodega chopped cheese is a neighborhood's autobiography written in meat and oil.",
            "A hot dog is a sandwich only if you believe identity is determined by structure rather than intent.",
            "The best meals are the ones where you forget you're eating.",
            "Every culture's street food tells you what they value: speed, community, or spectacle.",
            "Sourdough is an act of patience in a world that rewards impatience.",
            "A recipe is a score. The cook is the performer.",
            "Salt doesn't add flavor. It reveals what was already there.",
        ],
    },
    LibraryCategory {
        name: "Philosophy & Wisdom",
        fragments: &[
            "Experience without theory is blind, but theory without experience is mere intellectual play.",
            "You have to learn to proceed without certainty.",
            "The map is not the territory, but without maps we don't move.",
            "We don't see things as they are. We see things as we are.",
            "The obstacle is the way.",
            "Between stimulus and response there is a space. In that space is our freedom.",
            "All models are wrong. Some models are useful.",
            "The only true wisdom is knowing you know nothing.",
            "To understand is to perceive patterns.",
            "Reality is that which, when you stop believing in it, doesn't go away.",
        ],
    },
    LibraryCategory {
        name: "Design & Making",
        fragments: &[
            "Design is not how it looks. Design is how it works.",
            "The details are not the details. They make the design.",
            "Every tool shapes the hand that uses it.",
            "Constraints are the mother of creativity.",
            "A building is a machine for living in.",
            "The best interface is no interface.",
            "Good design is as little design as possible.",
            "Form follows function, but function follows worldview.",
            "The medium is the message.",
            "Architecture is frozen music.",
        ],
    },
    LibraryCategory {
        name: "Music & Sound",
        fragments: &[
            "Music is the space between the notes.",
            "Every jazz solo is a conversation with the room.",
            "The wrong note played with conviction is more alive than the right note played with fear.",
            "Rhythm is the skeleton. Melody is the skin. Harmony is the nervous system.",
            "Silence is not empty. It is full of answers.",
            "A song you know by heart lives in your body, not your brain.",
            "Tuning is a negotiation between mathematics and the ear.",
            "The best musicians listen more than they play.",
        ],
    },
    LibraryCategory {
        name: "Human Connection",
        fragments: &[
            "Hurt people hurt people.",
            "Nothing changes if nothing changes.",
            "The opposite of addiction is not sobriety. It's connection.",
            "People don't resist change. They resist being changed.",
            "You can't hate someone whose story you know.",
            "Loneliness is not the absence of people. It's the absence of meaning.",
            "Every person you meet knows something you don't.",
            "The conversation is the relationship.",
            "We teach people how to treat us.",
            "Trust is built in drops and lost in buckets.",
        ],
    },
    LibraryCategory {
        name: "Nature & Science",
        fragments: &[
            "There are cathedrals everywhere for those with eyes to see.",
            "A tree is a slow explosion.",
            "Entropy is not disorder. It is the universe forgetting where it put things.",
            "The universe is under no obligation to make sense to you.",
            "Evolution doesn't have a direction. It has a memory.",
            "Water always finds the path of least resistance, and carves canyons doing it.",
            "Every atom in your body was forged in a star that died.",
            "Emergence: the whole is not only greater than the parts, it is different from them.",
        ],
    },
    LibraryCategory {
        name: "Technology & AI",
        fragments: &[
            "We shape our tools, and thereafter our tools shape us.",
            "The computer is a bicycle for the mind.",
            "Any sufficiently advanced technology is indistinguishable from magic.",
            "Automation doesn't replace jobs. It replaces tasks.",
            "Data is not information. Information is not knowledge. Knowledge is not wisdom.",
            "The best technology disappears.",
            "AI doesn't think. It pattern-matches at scale. But then again, what is thinking?",
            "Code is poetry that happens to execute.",
        ],
    },
    LibraryCategory {
        name: "Space & Place",
        fragments: &[
            "A city is a language spoken by buildings.",
            "Home is not where you're from. It's where you stop explaining yourself.",
            "Every room remembers what happened in it.",
            "The best public spaces make strangers feel like neighbors.",
            "A border is a story one group tells to keep another group out.",
            "You can know a culture by what it builds to last.",
            "Ruins are the architecture of memory.",
            "The map you carry in your head is more real than the ground beneath your feet.",
        ],
    },
    LibraryCategory {
        name: "Time & Memory",
        fragments: &[
            "Nostalgia is a dirty liar that insists things were better than they were.",
            "The future is already here. It's just not evenly distributed.",
            "Memory is not a recording. It's a reconstruction.",
            "Every photograph is a small death.",
            "We are what we repeatedly do.",
            "History doesn't repeat, but it rhymes.",
            "The present is the only time that exists, and it has no duration.",
            "Tradition is not the worship of ashes but the preservation of fire.",
        ],
    },
    LibraryCategory {
        name: "Body & Perception",
        fragments: &[
            "The body knows things the mind refuses to admit.",
            "You don't have a body. You are a body.",
            "Pain is inevitable. Suffering is optional.",
            "The eyes see only what the mind is prepared to comprehend.",
            "Dance is the hidden language of the soul.",
            "Breath is the bridge between the voluntary and the involuntary.",
            "Your posture is your autobiography.",
            "We feel before we think. Always.",
        ],
    },
];

/// Up to `count` distinct fragments drawn from every shelf.
pub fn random_mix<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<&'static str> {
    let all = LIBRARY
        .iter()
        .flat_map(|category| category.fragments.iter().copied())
        .collect::<Vec<_>>();
    all.choose_multiple(rng, count).copied().collect()
}

/// One fragment from each of up to `count` different shelves.
pub fn random_diverse<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<&'static str> {
    LIBRARY
        .choose_multiple(rng, count)
        .filter_map(|category| category.fragments.choose(rng).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn shelf_of(text: &str) -> &'static str {
        LIBRARY
            .iter()
            .find(|category| category.fragments.iter().any(|fragment| *fragment == text))
            .map(|category| category.name)
            .unwrap()
    }

    #[test]
    fn shelves_are_named_and_stocked() {
        assert_eq!(LIBRARY.len(), 10);
        assert!(LIBRARY.iter().all(|category| category.fragments.len() >= 8));

        let names = LIBRARY.iter().map(|category| category.name).collect::<HashSet<_>>();
        assert_eq!(names.len(), LIBRARY.len());
    }

    #[test]
    fn picks_are_distinct_and_capped() {
        let mut rng = StdRng::seed_from_u64(4);
        let shelf = &LIBRARY[3];

        let picks = shelf.pick(3, &mut rng);
        assert_eq!(picks.len(), 3);
        assert_eq!(picks.iter().collect::<HashSet<_>>().len(), 3);
        assert!(picks.iter().all(|text| shelf.fragments.contains(text)));

        assert_eq!(shelf.pick(100, &mut rng).len(), shelf.fragments.len());

        let mix = random_mix(8, &mut rng);
        assert_eq!(mix.iter().collect::<HashSet<_>>().len(), 8);
    }

    #[test]
    fn diverse_picks_come_from_different_shelves() {
        let mut rng = StdRng::seed_from_u64(9);
        let picks = random_diverse(5, &mut rng);
        assert_eq!(picks.len(), 5);

        let shelves = picks.iter().map(|text| shelf_of(text)).collect::<HashSet<_>>();
        assert_eq!(shelves.len(), 5);
        assert_eq!(random_diverse(50, &mut rng).len(), LIBRARY.len());
    }
}
