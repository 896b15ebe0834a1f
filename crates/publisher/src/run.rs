use std::collections::BTreeMap;

use pipeline::{
    CommentRow, ExistingIssueIndex, IssueTracker, IssueUrl, RowProcessor, RunFilters,
};
use tracing::{debug, info};

use crate::PublishError;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Issues created in the tracker.
    pub created: usize,
    /// Issues that a live run would have created (dry-run only).
    pub previewed: usize,
    /// Rows skipped for any reason.
    pub skipped: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// URL of every created issue, keyed by the table position of its row.
    pub created: BTreeMap<usize, IssueUrl>,
    /// Final counts.
    pub summary: RunSummary,
    /// `true` if the creation limit cut the run short.
    pub limit_reached: bool,
}

/// Publishes comment rows into an issue tracker.
pub struct Publisher<'a, T: IssueTracker + ?Sized> {
    tracker: &'a T,
    dry_run: bool,
}

impl<'a, T: IssueTracker + ?Sized> Publisher<'a, T> {
    /// In dry-run mode nothing is written to `tracker`; it is only read.
    pub fn new(tracker: &'a T, dry_run: bool) -> Self {
        Self { tracker, dry_run }
    }

    /// Takes the existing-issue snapshot.
    pub async fn index_existing(&self) -> Result<ExistingIssueIndex, PublishError> {
        let bodies = self.tracker.list_issue_bodies().await?;
        let index = ExistingIssueIndex::from_bodies(&bodies);
        info!(
            issues = bodies.len(),
            identified = index.len(),
            "Indexed existing issues"
        );
        Ok(index)
    }

    /// Runs all three phases over `rows`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Validation`] if any row carries an unknown label.
    ///   Nothing has been created at that point.
    /// - [`PublishError::Tracker`] if indexing or an issue creation fails.
    ///   Issues created before the failure remain in the tracker.
    pub async fn run(
        &self,
        rows: &[CommentRow],
        version: &str,
        filters: &RunFilters,
    ) -> Result<RunReport, PublishError> {
        let index = self.index_existing().await?;
        let plan = RowProcessor::new(&index, version, filters).plan(rows)?;

        let mut report = RunReport {
            summary: RunSummary {
                skipped: plan.skip_count(),
                ..RunSummary::default()
            },
            limit_reached: plan.limit_reached,
            ..RunReport::default()
        };

        for (position, draft) in plan.creates() {
            let labels: Vec<&str> = draft.labels.iter().map(|l| l.name()).collect();
            if self.dry_run {
                info!(title = %draft.title, ?labels, "Would create issue");
                debug!(title = %draft.title, body = %draft.body, "Issue body preview");
                report.summary.previewed += 1;
                continue;
            }
            let url = self.tracker.create_issue(draft).await?;
            info!(title = %draft.title, ?labels, %url, "Created issue");
            report.created.insert(position, url);
            report.summary.created += 1;
        }

        info!(
            created = report.summary.created,
            previewed = report.summary.previewed,
            skipped = report.summary.skipped,
            dry_run = self.dry_run,
            "Run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pipeline::issue_body::identity_marker;
    use pipeline::{IdentityHash, IssueDraft, TrackerError, ValidationError};

    /// In-memory tracker that remembers what was filed.
    #[derive(Default)]
    struct FakeTracker {
        issues: Mutex<Vec<String>>,
        created: Mutex<Vec<IssueDraft>>,
        fail_creates: bool,
    }

    impl FakeTracker {
        fn with_bodies(bodies: &[String]) -> Self {
            Self {
                issues: Mutex::new(bodies.to_vec()),
                ..Self::default()
            }
        }

        fn created_titles(&self) -> Vec<String> {
            self.created
                .lock()
                .expect("lock")
                .iter()
                .map(|d| d.title.clone())
                .collect()
        }
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn list_issue_bodies(&self) -> Result<Vec<String>, TrackerError> {
            Ok(self.issues.lock().expect("lock").clone())
        }

        async fn create_issue(&self, draft: &IssueDraft) -> Result<IssueUrl, TrackerError> {
            if self.fail_creates {
                return Err(TrackerError::Api {
                    status: 500,
                    message: "Server Error".into(),
                });
            }
            let mut issues = self.issues.lock().expect("lock");
            issues.push(draft.body.clone());
            self.created.lock().expect("lock").push(draft.clone());
            let url = format!("https://github.com/acme/widget/issues/{}", issues.len());
            Ok(IssueUrl::new(url).expect("non-empty"))
        }
    }

    fn row(position: usize, labels: &str, clauses: &str, title: &str, comment: &str) -> CommentRow {
        CommentRow {
            position,
            label_tags: labels.into(),
            source: "Acme".into(),
            clauses: clauses.into(),
            comment_title: title.into(),
            comment_body: comment.into(),
            suggestion_body: String::new(),
        }
    }

    fn existing_body(title: &str, comment: &str) -> String {
        let hash = IdentityHash::compute(title, comment, "");
        format!("{}\nfiled earlier", identity_marker(&hash))
    }

    #[tokio::test]
    async fn mixed_document_creates_only_eligible_rows() {
        let tracker = FakeTracker::with_bodies(&[existing_body("§2: Old", "Already filed")]);
        let rows = vec![
            row(1, "te", "2", "Old", "Already filed"),
            row(2, "ed", "3", "First", "One"),
            row(3, "ge", "!4", "Private", "Not for publication"),
            row(4, "", "", "No comment", ""),
            row(5, "?", "5", "Second", "Two"),
            row(6, "te", "6", "Third", "Three"),
        ];
        let filters = RunFilters {
            limit: Some(2),
            ..RunFilters::default()
        };

        let report = Publisher::new(&tracker, false)
            .run(&rows, "Draft 3", &filters)
            .await
            .expect("run");

        assert_eq!(tracker.created_titles(), vec!["§3: First", "§5: Second"]);
        assert_eq!(report.created.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert!(report.limit_reached);
        assert_eq!(
            report.summary,
            RunSummary {
                created: 2,
                previewed: 0,
                skipped: 3
            }
        );
    }

    #[tokio::test]
    async fn unknown_label_creates_nothing() {
        let tracker = FakeTracker::default();
        let rows = vec![
            row(1, "te", "5", "Fine", "Looks fine"),
            row(2, "xx", "6", "Broken", "Bad label"),
        ];

        let err = Publisher::new(&tracker, false)
            .run(&rows, "v1", &RunFilters::default())
            .await
            .expect_err("unknown label");

        assert_eq!(
            err,
            PublishError::Validation(ValidationError::UnknownLabel { code: "xx".into() })
        );
        assert!(tracker.created_titles().is_empty());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let tracker = FakeTracker::default();
        let rows = vec![row(1, "te", "5", "Typo", "Fix"), row(2, "ed", "", "Wording", "Reword")];

        let first = Publisher::new(&tracker, false)
            .run(&rows, "v1", &RunFilters::default())
            .await
            .expect("first run");
        assert_eq!(first.summary.created, 2);

        let second = Publisher::new(&tracker, false)
            .run(&rows, "v1", &RunFilters::default())
            .await
            .expect("second run");
        assert_eq!(second.summary.created, 0);
        assert_eq!(second.summary.skipped, 2);
        assert!(second.created.is_empty());
    }

    #[tokio::test]
    async fn dry_run_previews_up_to_the_limit_without_writing() {
        let tracker = FakeTracker::default();
        let rows = vec![
            row(1, "te", "1", "A", "a"),
            row(2, "te", "2", "B", "b"),
            row(3, "te", "3", "C", "c"),
        ];
        let filters = RunFilters {
            limit: Some(2),
            ..RunFilters::default()
        };

        let report = Publisher::new(&tracker, true)
            .run(&rows, "v1", &filters)
            .await
            .expect("dry run");

        assert!(tracker.created_titles().is_empty());
        assert!(report.created.is_empty());
        assert_eq!(report.summary.previewed, 2);
        assert!(report.limit_reached);
    }

    #[tokio::test]
    async fn tracker_failure_aborts_the_run() {
        let tracker = FakeTracker {
            fail_creates: true,
            ..FakeTracker::default()
        };
        let rows = vec![row(1, "te", "5", "Typo", "Fix")];

        let err = Publisher::new(&tracker, false)
            .run(&rows, "v1", &RunFilters::default())
            .await
            .expect_err("tracker down");
        assert!(matches!(err, PublishError::Tracker(TrackerError::Api { status: 500, .. })));
    }
}
