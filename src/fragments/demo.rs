use super::model::Fragment;

const DEMO_TEXTS: [&str; 8] = [
    "Bread is architecture. The crust is load-bearing; the crumb is insulation.",
    "The PB&J is America's most democratic sandwich: classless, ageless, requires no skill.",
    "A bodega chopped cheese is a neighborhood's autobiography written in meat and oil.",
    "The French have 350 cheeses and one sandwich. Americans have one cheese and 350 sandwiches.",
    "Every sandwich is a negotiation between structure and overflow.",
    "The tortilla wrap is a sandwich in denial: same logic, different topology.",
    "Fermentation is the oldest conversation between humans and microbes.",
    "A hot dog is a sandwich only if you believe identity is determined by structure rather than intent.",
];

pub fn demo_fragments() -> Vec<Fragment> {
    DEMO_TEXTS
        .iter()
        .enumerate()
        .map(|(index, text)| Fragment::text(format!("frag-{}", index + 1), *text))
        .collect()
}
