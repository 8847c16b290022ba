/// Raw forms that don't survive plain lowercasing/hyphenation, mapped to their
/// catalog keys. Applied after whitespace has been turned into hyphens.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("mr.-mime", "mr-mime"),
    ("farfetch\u{2019}d", "farfetchd"),
    ("farfetch'd", "farfetchd"),
    ("nidoran\u{2640}", "nidoran-f"),
    ("nidoran\u{2642}", "nidoran-m"),
];

pub(crate) fn normalize_name(raw: &str) -> String {
    let mut name = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    for (from, to) in SUBSTITUTIONS {
        if name.contains(from) {
            name = name.replace(from, to);
        }
    }
    name
}
