/// Levenshtein edit distance over chars, two-row variant.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Shorter string in the inner loop.
    let (a, b, m, n) = if m <= n { (a, b, m, n) } else { (b, a, n, m) };

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// `1 − distance / longer length`, in `0.0..=1.0`.
pub fn similarity(s1: &str, s2: &str) -> f32 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(s1, s2) as f32 / max_len as f32)
}

/// Lowercase and keep only letters and digits, so "Trader Joe's" and
/// "TRADER JOES" compare equal.
pub fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Best similarity between `needle` and any run of consecutive words in
/// `line` with the same word count as `needle`.
pub fn best_window_similarity(line: &str, needle: &str) -> f32 {
    let target = fold(needle);
    if target.is_empty() {
        return 0.0;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let width = needle.split_whitespace().count().max(1);
    if words.len() < width {
        return similarity(&fold(line), &target);
    }
    words
        .windows(width)
        .map(|w| similarity(&fold(&w.join(" ")), &target))
        .fold(0.0f32, f32::max)
}
