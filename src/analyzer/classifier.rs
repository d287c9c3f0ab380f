//! License text classifier
//!
//! Identifies a license from raw text using three strategies, strongest
//! first: explicit `SPDX-License-Identifier` lines, canonical phrase matching
//! against the license database, and structural clause analysis. Every
//! strategy proposes candidates; the classifier keeps the best score per
//! license and ranks them.

use super::database::{LicenseDb, LICENSE_DB};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::{HashMap, HashSet};

/// How a candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationMethod {
    /// `SPDX-License-Identifier:` line
    SpdxHeader,
    /// Bare SPDX identifier somewhere in the text
    SpdxIdentifier,
    /// Canonical phrases of the license text
    TextPattern,
    /// Clause presence/absence heuristics
    StructuralAnalysis,
}

/// One candidate license for a piece of text
#[derive(Debug, Clone)]
pub struct Classification {
    pub license: String,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub method: ClassificationMethod,
    /// Matched phrases, for debug logging
    pub evidence: Vec<String>,
    hits: usize,
}

/// License classifier engine
pub struct LicenseClassifier {
    db: &'static LicenseDb,
    spdx_matcher: AhoCorasick,
    /// pattern index -> license index
    spdx_owner: Vec<usize>,
    text_matcher: AhoCorasick,
    text_patterns: Vec<&'static str>,
    text_owner: Vec<usize>,
}

impl LicenseClassifier {
    pub fn new() -> Self {
        let db: &'static LicenseDb = &LICENSE_DB;

        let mut spdx_patterns = Vec::new();
        let mut spdx_owner = Vec::new();
        let mut text_patterns = Vec::new();
        let mut text_owner = Vec::new();
        for (li, license) in db.all().iter().enumerate() {
            for pattern in license.spdx_patterns {
                spdx_patterns.push(*pattern);
                spdx_owner.push(li);
            }
            for pattern in license.text_patterns {
                text_patterns.push(*pattern);
                text_owner.push(li);
            }
        }

        Self {
            db,
            spdx_matcher: build_matcher(&spdx_patterns, MatchKind::LeftmostLongest),
            spdx_owner,
            text_matcher: build_matcher(&text_patterns, MatchKind::Standard),
            text_patterns,
            text_owner,
        }
    }

    /// Best candidate for the text, if any
    pub fn classify(&self, text: &str) -> Option<Classification> {
        self.candidates(text).into_iter().next()
    }

    /// All candidates, one per license, best first
    pub fn candidates(&self, text: &str) -> Vec<Classification> {
        let normalized = normalize_whitespace(text);
        let mut found: Vec<Classification> = Vec::new();

        // Strategy 1: explicit SPDX header (highest confidence)
        if let Some(c) = detect_spdx_header(text) {
            found.push(c);
        }

        // Strategy 2: bare SPDX identifiers and canonical phrases
        found.extend(self.detect_spdx_identifiers(&normalized));
        found.extend(self.detect_text_patterns(&normalized));

        // Strategy 3: structural clause analysis
        if let Some(c) = detect_structural(&normalized) {
            found.push(c);
        }

        let mut best: HashMap<String, Classification> = HashMap::new();
        for candidate in found {
            match best.get(&candidate.license) {
                Some(existing) if rank(existing, &candidate).is_le() => {}
                _ => {
                    best.insert(candidate.license.clone(), candidate);
                }
            }
        }

        let mut ranked: Vec<Classification> = best.into_values().collect();
        ranked.sort_by(rank);
        ranked
    }

    fn detect_spdx_identifiers(&self, text: &str) -> Vec<Classification> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for mat in self.spdx_matcher.find_iter(text) {
            if !is_word_bounded(text, mat.start(), mat.end()) {
                continue;
            }
            *counts.entry(self.spdx_owner[mat.pattern().as_usize()]).or_default() += 1;
        }

        let all = self.db.all();
        counts
            .into_iter()
            .map(|(li, count)| Classification {
                license: all[li].id.to_string(),
                confidence: (0.7 + count as f32 * 0.05).min(0.85),
                method: ClassificationMethod::SpdxIdentifier,
                evidence: vec![format!("SPDX ID '{}' found {} times", all[li].id, count)],
                hits: count,
            })
            .collect()
    }

    fn detect_text_patterns(&self, text: &str) -> Vec<Classification> {
        let mut hits: HashMap<usize, HashSet<usize>> = HashMap::new();
        for mat in self.text_matcher.find_overlapping_iter(text) {
            let pattern = mat.pattern().as_usize();
            hits.entry(self.text_owner[pattern]).or_default().insert(pattern);
        }

        let all = self.db.all();
        hits.into_iter()
            .map(|(li, patterns)| {
                let license = &all[li];
                let ratio = patterns.len() as f32 / license.text_patterns.len() as f32;
                let mut evidence: Vec<String> = patterns
                    .iter()
                    .map(|&p| self.text_patterns[p].to_string())
                    .collect();
                evidence.sort();
                Classification {
                    license: license.id.to_string(),
                    confidence: (0.5 + ratio * 0.4).min(0.90),
                    method: ClassificationMethod::TextPattern,
                    evidence,
                    hits: patterns.len(),
                }
            })
            .collect()
    }
}

impl Default for LicenseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn build_matcher(patterns: &[&str], kind: MatchKind) -> AhoCorasick {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(kind)
        .build(patterns)
        .expect("Failed to build license pattern matcher")
}

/// Higher confidence first, then more distinct hits, then name for stable output
fn rank(a: &Classification, b: &Classification) -> std::cmp::Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(b.hits.cmp(&a.hits))
        .then(a.license.cmp(&b.license))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// `SPDX-License-Identifier: <expr>` in the first lines of the text
fn detect_spdx_header(text: &str) -> Option<Classification> {
    for line in text.lines().take(50) {
        let trimmed = line
            .trim()
            .trim_start_matches(['#', '/', '*', ';', '-'])
            .trim_start_matches("<!--")
            .trim();
        if let Some(rest) = trimmed.strip_prefix("SPDX-License-Identifier:") {
            let id = rest.trim().trim_end_matches("*/").trim_end_matches("-->").trim();
            if !id.is_empty() {
                return Some(Classification {
                    license: id.to_string(),
                    confidence: 0.99,
                    method: ClassificationMethod::SpdxHeader,
                    evidence: vec![line.trim().to_string()],
                    hits: 1,
                });
            }
        }
    }
    None
}

/// Guess from clause presence when no canonical phrase matched
fn detect_structural(text: &str) -> Option<Classification> {
    let lower = text.to_lowercase();

    let has_patent_clause = lower.contains("patent") && lower.contains("grant");
    let has_copyleft = lower.contains("derivative work")
        && (lower.contains("same license") || lower.contains("same terms"));
    let has_network_clause = lower.contains("interact with it remotely")
        || lower.contains("network server")
        || lower.contains("over a computer network");
    let has_attribution = lower.contains("copyright notice") && lower.contains("permission notice");
    let has_no_warranty = lower.contains("as is") && lower.contains("without warranty");

    let (license, confidence, evidence): (&str, f32, &[&str]) = if has_network_clause && has_copyleft {
        ("AGPL-3.0-only", 0.75, &["Network interaction clause", "Copyleft clause"])
    } else if has_copyleft && has_patent_clause {
        ("GPL-3.0-only", 0.70, &["Copyleft clause", "Patent grant clause"])
    } else if has_copyleft {
        ("GPL-2.0-only", 0.65, &["Copyleft clause without patent grant"])
    } else if has_patent_clause && has_attribution {
        ("Apache-2.0", 0.70, &["Patent grant clause", "Attribution requirement"])
    } else if has_attribution && has_no_warranty {
        ("MIT", 0.60, &["Attribution + no warranty, no copyleft/patent"])
    } else {
        return None;
    };

    Some(Classification {
        license: license.to_string(),
        confidence,
        method: ClassificationMethod::StructuralAnalysis,
        evidence: evidence.iter().map(|e| e.to_string()).collect(),
        hits: evidence.len(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const MIT_TEXT: &str = "MIT License

Copyright (c) 2018 Acme Corp

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY.
";

    pub(crate) const APACHE_TEXT: &str = "
                                 Apache License
                           Version 2.0, January 2004
                        http://www.apache.org/licenses/

   TERMS AND CONDITIONS FOR USE, REPRODUCTION, AND DISTRIBUTION

   1. Definitions.

   3. Grant of Patent License. Subject to the terms and conditions of
      this License, each Contributor hereby grants to You a perpetual,
      worldwide, non-exclusive, no-charge, royalty-free patent license.
";

    const BSD3_TEXT: &str = "Copyright (c) 2009 The Go Authors. All rights reserved.

Redistribution and use in source and binary forms, with or without
modification, are permitted provided that the following conditions are
met:

   * Redistributions of source code must retain the above copyright
notice, this list of conditions and the following disclaimer.
   * Redistributions in binary form must reproduce the above
copyright notice, this list of conditions and the following disclaimer
in the documentation and/or other materials provided with the
distribution.
   * Neither the name of Google Inc. nor the names of its
contributors may be used to endorse or promote products derived from
this software without specific prior written permission.
";

    const BSD2_TEXT: &str = "Copyright (c) 2014 Someone

Redistribution and use in source and binary forms, with or without
modification, are permitted provided that the following conditions are met:

1. Redistributions of source code must retain the above copyright notice,
   this list of conditions and the following disclaimer.
2. Redistributions in binary form must reproduce the above copyright notice,
   this list of conditions and the following disclaimer in the documentation.
";

    #[test]
    fn test_classify_mit() {
        let c = LicenseClassifier::new().classify(MIT_TEXT).unwrap();
        assert_eq!(c.license, "MIT");
        assert_eq!(c.method, ClassificationMethod::TextPattern);
        assert!(c.confidence >= 0.85);
    }

    #[test]
    fn test_classify_apache() {
        let c = LicenseClassifier::new().classify(APACHE_TEXT).unwrap();
        assert_eq!(c.license, "Apache-2.0");
        assert!(c.confidence >= 0.85);
    }

    #[test]
    fn test_bsd3_beats_bsd2() {
        let classifier = LicenseClassifier::new();
        assert_eq!(classifier.classify(BSD3_TEXT).unwrap().license, "BSD-3-Clause");
        assert_eq!(classifier.classify(BSD2_TEXT).unwrap().license, "BSD-2-Clause");
    }

    #[test]
    fn test_spdx_header_wins() {
        let text = "// SPDX-License-Identifier: MPL-2.0\n\npackage foo\n";
        let c = LicenseClassifier::new().classify(text).unwrap();
        assert_eq!(c.license, "MPL-2.0");
        assert_eq!(c.method, ClassificationMethod::SpdxHeader);
        assert!((c.confidence - 0.99).abs() < f32::EPSILON);
    }

    #[test]
    fn test_identifier_requires_word_boundary() {
        // "MIT" inside "permitted" and "submitted" must not count
        let text = "Use is permitted for anything submitted upstream.";
        assert!(LicenseClassifier::new().classify(text).is_none());
    }

    #[test]
    fn test_unrelated_text_has_no_candidates() {
        assert!(LicenseClassifier::new().candidates("hello world\n").is_empty());
    }

    #[test]
    fn test_candidates_are_ranked_and_unique() {
        let candidates = LicenseClassifier::new().candidates(MIT_TEXT);
        let names: HashSet<&str> = candidates.iter().map(|c| c.license.as_str()).collect();
        assert_eq!(names.len(), candidates.len());
        for pair in candidates.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_structural_fallback() {
        let text = "Keep the copyright notice and this permission notice. \
                    Provided as is, without warranty.";
        let c = LicenseClassifier::new().classify(text).unwrap();
        assert_eq!(c.license, "MIT");
        assert_eq!(c.method, ClassificationMethod::StructuralAnalysis);
    }
}
