use strum::{Display, EnumIter, IntoEnumIterator};

use crate::github::issues::PullRequestSummary;

const BUG_KEYWORDS: &[&str] = &["bug", "fix", "defect", "hotfix"];
const ENHANCEMENT_KEYWORDS: &[&str] = &["feature", "enhancement", "new", "feat"];

/// Report buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Category {
    #[strum(serialize = "Bug Fixes")]
    BugFix,
    #[strum(serialize = "Enhancements/Features")]
    Enhancement,
    #[strum(serialize = "Other Changes")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub category: Category,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedReleaseReport {
    pub tag: String,
    pub total_found: usize,
    /// All three buckets, always in `Category` order.
    pub buckets: Vec<Bucket>,
}

impl CategorizedReleaseReport {
    pub fn non_empty(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().filter(|b| !b.entries.is_empty())
    }
}

/// First matching rule wins: bug keywords beat enhancement keywords.
pub fn classify(pr: &PullRequestSummary) -> Category {
    let title = pr.title.to_lowercase();
    let labels: Vec<String> = pr.labels.iter().map(|l| l.to_lowercase()).collect();
    let has_label = |keywords: &[&str]| labels.iter().any(|l| keywords.contains(&l.as_str()));

    if has_label(BUG_KEYWORDS) || title.starts_with("fix") {
        Category::BugFix
    } else if has_label(ENHANCEMENT_KEYWORDS) || title.starts_with("feat") {
        Category::Enhancement
    } else {
        Category::Other
    }
}

pub fn categorize(tag: &str, prs: &[PullRequestSummary]) -> CategorizedReleaseReport {
    let mut buckets: Vec<Bucket> = Category::iter()
        .map(|category| Bucket {
            category,
            entries: Vec::new(),
        })
        .collect();

    for pr in prs {
        let category = classify(pr);
        if let Some(bucket) = buckets.iter_mut().find(|b| b.category == category) {
            bucket.entries.push(format!("#{}: {}", pr.number, pr.title));
        }
    }

    CategorizedReleaseReport {
        tag: tag.to_string(),
        total_found: prs.len(),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl CategorizedReleaseReport {
        fn bucket(&self, category: Category) -> &[String] {
            self.buckets
                .iter()
                .find(|b| b.category == category)
                .map(|b| b.entries.as_slice())
                .unwrap_or_default()
        }
    }

    fn pr(number: u64, title: &str, labels: &[&str]) -> PullRequestSummary {
        PullRequestSummary {
            number,
            title: title.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            html_url: format!("https://github.com/o/r/pull/{number}"),
            merged_at: None,
        }
    }

    #[test]
    fn test_categorize_scenario() {
        let prs = vec![
            pr(5, "Fix null pointer", &[]),
            pr(6, "Add dark mode", &["feature"]),
            pr(7, "Update docs", &[]),
        ];
        let report = categorize("v2.9.0", &prs);
        assert_eq!(report.total_found, 3);
        assert_eq!(report.bucket(Category::BugFix), ["#5: Fix null pointer"]);
        assert_eq!(report.bucket(Category::Enhancement), ["#6: Add dark mode"]);
        assert_eq!(report.bucket(Category::Other), ["#7: Update docs"]);
    }

    #[test]
    fn test_bug_label_beats_feature_label() {
        let p = pr(1, "Dark mode", &["Feature", "BUG"]);
        assert_eq!(classify(&p), Category::BugFix);
    }

    #[test]
    fn test_title_prefixes_are_case_insensitive() {
        assert_eq!(classify(&pr(1, "FIX: crash", &[])), Category::BugFix);
        assert_eq!(classify(&pr(2, "feat(ui): tabs", &[])), Category::Enhancement);
        assert_eq!(classify(&pr(3, "Features page", &[])), Category::Enhancement);
    }

    #[test]
    fn test_labels_match_whole_keywords_only() {
        assert_eq!(classify(&pr(1, "Docs", &["bugfix"])), Category::Other);
        assert_eq!(classify(&pr(2, "Docs", &["hotfix"])), Category::BugFix);
        assert_eq!(classify(&pr(3, "Docs", &["new"])), Category::Enhancement);
    }

    #[test]
    fn test_enhancement_title_with_bug_label() {
        assert_eq!(classify(&pr(1, "feat: retries", &["defect"])), Category::BugFix);
    }

    #[test]
    fn test_entries_keep_original_case() {
        let report = categorize("v1", &[pr(12, "FIX Login Flow", &[])]);
        assert_eq!(report.bucket(Category::BugFix), ["#12: FIX Login Flow"]);
    }

    #[test]
    fn test_total_matches_bucket_sizes() {
        let prs: Vec<_> = (0..30)
            .map(|n| match n % 3 {
                0 => pr(n, "fix thing", &[]),
                1 => pr(n, "misc", &["enhancement"]),
                _ => pr(n, "chore", &["docs"]),
            })
            .collect();
        let report = categorize("v1", &prs);
        let sum: usize = report.buckets.iter().map(|b| b.entries.len()).sum();
        assert_eq!(report.total_found, sum);
        assert_eq!(sum, 30);
    }

    #[test]
    fn test_categorize_is_idempotent() {
        let prs = vec![pr(1, "fix a", &[]), pr(2, "b", &["feat"]), pr(3, "c", &[])];
        assert_eq!(categorize("v1", &prs), categorize("v1", &prs));
    }

    #[test]
    fn test_non_empty_preserves_order() {
        let prs = vec![pr(1, "chore", &[]), pr(2, "fix it", &[])];
        let report = categorize("v1", &prs);
        let order: Vec<Category> = report.non_empty().map(|b| b.category).collect();
        assert_eq!(order, vec![Category::BugFix, Category::Other]);
    }

    #[test]
    fn test_empty_list() {
        let report = categorize("v1", &[]);
        assert_eq!(report.total_found, 0);
        assert_eq!(report.non_empty().count(), 0);
        assert_eq!(report.buckets.len(), 3);
    }
}
