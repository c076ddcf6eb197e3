//! Exact and fuzzy deduplication.
//!
//! Both passes share one eligibility rule and one "pick the keep index"
//! rule; fuzzy dedup only considers indices the exact pass left alone.

use std::collections::{HashMap, HashSet};

use crate::hash::exact_dedup_hash;
use crate::types::{DedupAnnotation, Message};

/// Lines of fingerprint considered when bucketing candidates for fuzzy
/// matching, and the minimum shared-line overlap required to even compare
/// two messages. Internal constants, not exposed as options: this
/// heuristic is untuned and deliberately not a public knob.
const FINGERPRINT_LINES: usize = 5;
const MIN_SHARED_LINES: usize = 3;
const LENGTH_RATIO_MIN: f64 = 0.7;

const MIN_ELIGIBLE_LEN: usize = 200;

/// True iff `message` is a dedup candidate: not preserved by role, no
/// tool calls, not already a summary, and long enough to matter.
pub fn is_eligible(message: &Message, preserve_roles: &[String]) -> bool {
    if message.has_tool_calls() {
        return false;
    }
    if message.is_already_summary() {
        return false;
    }
    if let Some(role) = &message.role {
        if preserve_roles.iter().any(|p| p == role) {
            return false;
        }
    }
    message.content_len() >= MIN_ELIGIBLE_LEN
}

/// Pick the "keep" index among a group of duplicate slot indices: the
/// first occurrence inside the recency window if any, otherwise the
/// latest occurrence.
fn pick_keep(group: &[usize], len: usize, recency_start: usize) -> usize {
    if let Some(&first_in_window) = group.iter().find(|&&i| i >= recency_start && recency_start < len) {
        first_in_window
    } else {
        *group.iter().max().unwrap()
    }
}

/// Result of the exact-dedup pass: annotations keyed by slot index.
pub fn exact_dedup(
    messages: &[Message],
    preserve_roles: &[String],
    recency_start: usize,
) -> HashMap<usize, DedupAnnotation> {
    let mut by_hash: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, m) in messages.iter().enumerate() {
        if !is_eligible(m, preserve_roles) {
            continue;
        }
        let content = m.content.as_deref().unwrap_or("");
        by_hash.entry(exact_dedup_hash(content)).or_default().push(i);
    }

    let mut annotations = HashMap::new();
    for indices in by_hash.values() {
        if indices.len() < 2 {
            continue;
        }
        // Sub-group by exact string equality to defend against hash collisions.
        let mut sub_groups: Vec<Vec<usize>> = Vec::new();
        for &i in indices {
            let content = messages[i].content.as_deref().unwrap_or("");
            if let Some(group) = sub_groups
                .iter_mut()
                .find(|g| messages[g[0]].content.as_deref().unwrap_or("") == content)
            {
                group.push(i);
            } else {
                sub_groups.push(vec![i]);
            }
        }
        for group in sub_groups {
            if group.len() < 2 {
                continue;
            }
            let keep = pick_keep(&group, messages.len(), recency_start);
            let keep_len = messages[keep].content_len();
            for &i in &group {
                if i != keep {
                    annotations.insert(
                        i,
                        DedupAnnotation {
                            duplicate_of_index: keep,
                            content_length: keep_len,
                            similarity: None,
                        },
                    );
                }
            }
        }
    }
    annotations
}

fn normalize_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect()
}

fn line_multiset(lines: &[String]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for l in lines {
        *counts.entry(l.as_str()).or_insert(0) += 1;
    }
    counts
}

fn jaccard(a: &HashMap<&str, usize>, b: &HashMap<&str, usize>) -> f64 {
    let mut intersection = 0usize;
    let mut union = 0usize;
    let keys: HashSet<&str> = a.keys().chain(b.keys()).copied().collect();
    for key in keys {
        let ca = *a.get(key).unwrap_or(&0);
        let cb = *b.get(key).unwrap_or(&0);
        intersection += ca.min(cb);
        union += ca.max(cb);
    }
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Fuzzy dedup over the slot indices the exact pass left alone. Returns
/// annotations keyed by slot index, alongside a similarity score.
pub fn fuzzy_dedup(
    messages: &[Message],
    preserve_roles: &[String],
    recency_start: usize,
    already_deduped: &HashSet<usize>,
    threshold: f64,
) -> HashMap<usize, DedupAnnotation> {
    let mut candidates: Vec<usize> = Vec::new();
    let mut normalized: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, m) in messages.iter().enumerate() {
        if already_deduped.contains(&i) || !is_eligible(m, preserve_roles) {
            continue;
        }
        let lines = normalize_lines(m.content.as_deref().unwrap_or(""));
        if lines.len() < 2 {
            continue;
        }
        candidates.push(i);
        normalized.insert(i, lines);
    }

    // Inverted index over fingerprint lines (first FINGERPRINT_LINES lines).
    let mut inverted: HashMap<&str, Vec<usize>> = HashMap::new();
    let fingerprints: HashMap<usize, HashSet<&str>> = candidates
        .iter()
        .map(|&i| {
            let lines = &normalized[&i];
            let fp: HashSet<&str> = lines
                .iter()
                .take(FINGERPRINT_LINES)
                .map(String::as_str)
                .collect();
            (i, fp)
        })
        .collect();
    for &i in &candidates {
        for line in &fingerprints[&i] {
            inverted.entry(line).or_default().push(i);
        }
    }

    let mut pairs: HashSet<(usize, usize)> = HashSet::new();
    for group in inverted.values() {
        for a in 0..group.len() {
            for b in (a + 1)..group.len() {
                let (i, j) = (group[a].min(group[b]), group[a].max(group[b]));
                pairs.insert((i, j));
            }
        }
    }

    let mut uf = UnionFind::new(messages.len());
    let mut pair_similarity: HashMap<(usize, usize), f64> = HashMap::new();

    for (i, j) in pairs {
        let shared = fingerprints[&i].intersection(&fingerprints[&j]).count();
        if shared < MIN_SHARED_LINES {
            continue;
        }
        let len_i = messages[i].content_len();
        let len_j = messages[j].content_len();
        let (min_len, max_len) = (len_i.min(len_j), len_i.max(len_j));
        if max_len == 0 || (min_len as f64 / max_len as f64) < LENGTH_RATIO_MIN {
            continue;
        }
        let multiset_i = line_multiset(&normalized[&i]);
        let multiset_j = line_multiset(&normalized[&j]);
        let similarity = jaccard(&multiset_i, &multiset_j);
        if similarity >= threshold {
            uf.union(i, j);
            pair_similarity.insert((i, j), similarity);
        }
    }

    // Group candidates by union-find root.
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for &i in &candidates {
        let root = uf.find(i);
        groups.entry(root).or_default().push(i);
    }

    let mut annotations = HashMap::new();
    for group in groups.values() {
        if group.len() < 2 {
            continue;
        }
        let keep = pick_keep(group, messages.len(), recency_start);
        for &i in group {
            if i != keep {
                let similarity = pair_similarity
                    .iter()
                    .find(|((a, b), _)| (*a == i && *b == keep) || (*a == keep && *b == i))
                    .map(|(_, s)| *s)
                    .unwrap_or(threshold);
                annotations.insert(
                    i,
                    DedupAnnotation {
                        duplicate_of_index: keep,
                        content_length: messages[i].content_len(),
                        similarity: Some(similarity),
                    },
                );
            }
        }
    }
    annotations
}
