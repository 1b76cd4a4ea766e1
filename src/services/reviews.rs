use std::collections::HashMap;

use crate::models::{MovieId, RequestId, Review};

/// Posting state of one movie's review form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostStatus {
    #[default]
    Idle,
    Posting,
    Succeeded,
    Failed,
}

/// Everything the review form tracks for a single movie
#[derive(Debug, Clone, Default)]
pub struct ReviewThread {
    draft: String,
    status: PostStatus,
    local: Vec<Review>,
    in_flight: Option<RequestId>,
    notice: Option<String>,
}

impl ReviewThread {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Reviews posted from here, in the order they were confirmed
    pub fn local_reviews(&self) -> &[Review] {
        &self.local
    }
}

/// Review posting for the movies shown in one popup
///
/// Threads are created on first touch. What a user sees for a movie is always
/// the server's reviews followed by the ones posted locally; the two lists are
/// never merged or deduplicated, so a review can show twice after a refetch.
#[derive(Debug, Default)]
pub struct ReviewMerger {
    threads: HashMap<MovieId, ReviewThread>,
}

impl ReviewMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread(&self, movie_id: MovieId) -> Option<&ReviewThread> {
        self.threads.get(&movie_id)
    }

    pub fn set_draft(&mut self, movie_id: MovieId, text: impl Into<String>) {
        self.threads.entry(movie_id).or_default().draft = text.into();
    }

    pub fn draft(&self, movie_id: MovieId) -> &str {
        self.threads.get(&movie_id).map(|t| t.draft()).unwrap_or("")
    }

    pub fn status(&self, movie_id: MovieId) -> PostStatus {
        self.threads
            .get(&movie_id)
            .map(|t| t.status)
            .unwrap_or_default()
    }

    /// Starts posting the draft, returning the ticket and the text to send
    ///
    /// Blank drafts and movies already posting yield `None`.
    pub fn begin_submit(&mut self, movie_id: MovieId) -> Option<(RequestId, String)> {
        let thread = self.threads.entry(movie_id).or_default();
        let text = thread.draft.trim();
        if text.is_empty() || thread.status == PostStatus::Posting {
            return None;
        }

        let text = text.to_string();
        let request_id = RequestId::new();
        thread.status = PostStatus::Posting;
        thread.in_flight = Some(request_id);
        thread.notice = None;
        Some((request_id, text))
    }

    fn take_ticket(&mut self, movie_id: MovieId, request_id: RequestId) -> Option<&mut ReviewThread> {
        let thread = self.threads.get_mut(&movie_id)?;
        if thread.in_flight != Some(request_id) {
            return None;
        }
        thread.in_flight = None;
        Some(thread)
    }

    /// Appends the stored review and clears the draft; `false` if the ticket is stale
    pub fn complete(&mut self, movie_id: MovieId, request_id: RequestId, review: Review) -> bool {
        let Some(thread) = self.take_ticket(movie_id, request_id) else {
            return false;
        };
        thread.local.push(review);
        thread.draft.clear();
        thread.status = PostStatus::Succeeded;
        true
    }

    /// Marks the post failed, keeping the draft for a retry; `false` if the ticket is stale
    pub fn fail(&mut self, movie_id: MovieId, request_id: RequestId, notice: impl Into<String>) -> bool {
        let Some(thread) = self.take_ticket(movie_id, request_id) else {
            return false;
        };
        thread.status = PostStatus::Failed;
        thread.notice = Some(notice.into());
        true
    }

    pub fn local_reviews(&self, movie_id: MovieId) -> &[Review] {
        self.threads
            .get(&movie_id)
            .map(|t| t.local_reviews())
            .unwrap_or(&[])
    }

    /// Server reviews followed by locally posted ones
    pub fn visible(&self, movie_id: MovieId, server_reviews: &[Review]) -> Vec<Review> {
        server_reviews
            .iter()
            .chain(self.local_reviews(movie_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIE: MovieId = MovieId(42);

    fn server_reviews() -> Vec<Review> {
        vec![Review::new("Loved it"), Review::new("Too long")]
    }

    #[test]
    fn test_successful_post_appends_and_clears_draft() {
        let mut merger = ReviewMerger::new();
        merger.set_draft(MOVIE, "great movie");

        let (ticket, text) = merger.begin_submit(MOVIE).unwrap();
        assert_eq!(text, "great movie");
        assert_eq!(merger.status(MOVIE), PostStatus::Posting);

        assert!(merger.complete(MOVIE, ticket, Review::new("great movie")));
        assert_eq!(merger.status(MOVIE), PostStatus::Succeeded);
        assert_eq!(merger.draft(MOVIE), "");

        let visible = merger.visible(MOVIE, &server_reviews());
        let texts: Vec<&str> = visible.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Loved it", "Too long", "great movie"]);

        // Empty draft now: submit is a no-op
        assert!(merger.begin_submit(MOVIE).is_none());
        assert_eq!(merger.status(MOVIE), PostStatus::Succeeded);
    }

    #[test]
    fn test_blank_draft_is_noop() {
        let mut merger = ReviewMerger::new();
        merger.set_draft(MOVIE, "   ");
        assert!(merger.begin_submit(MOVIE).is_none());
        assert_eq!(merger.status(MOVIE), PostStatus::Idle);
    }

    #[test]
    fn test_failure_keeps_draft() {
        let mut merger = ReviewMerger::new();
        merger.set_draft(MOVIE, "second thoughts");
        let (ticket, _) = merger.begin_submit(MOVIE).unwrap();

        assert!(merger.fail(MOVIE, ticket, "Failed to post review"));
        assert_eq!(merger.status(MOVIE), PostStatus::Failed);
        assert_eq!(merger.draft(MOVIE), "second thoughts");
        assert_eq!(
            merger.thread(MOVIE).unwrap().notice(),
            Some("Failed to post review")
        );
        assert!(merger.local_reviews(MOVIE).is_empty());

        // Retry goes through
        assert!(merger.begin_submit(MOVIE).is_some());
    }

    #[test]
    fn test_no_second_post_while_posting() {
        let mut merger = ReviewMerger::new();
        merger.set_draft(MOVIE, "first");
        assert!(merger.begin_submit(MOVIE).is_some());
        assert!(merger.begin_submit(MOVIE).is_none());
    }

    #[test]
    fn test_movies_are_independent() {
        let mut merger = ReviewMerger::new();
        let other = MovieId(7);
        merger.set_draft(MOVIE, "for 42");
        merger.set_draft(other, "for 7");

        let (t42, _) = merger.begin_submit(MOVIE).unwrap();
        let (t7, _) = merger.begin_submit(other).unwrap();

        // Tickets only complete their own movie
        assert!(!merger.complete(MOVIE, t7, Review::new("wrong")));
        assert!(merger.complete(other, t7, Review::new("for 7")));
        assert!(merger.fail(MOVIE, t42, "nope"));

        assert_eq!(merger.local_reviews(other).len(), 1);
        assert!(merger.local_reviews(MOVIE).is_empty());
        assert_eq!(merger.draft(MOVIE), "for 42");
    }

    #[test]
    fn test_no_deduplication_against_server() {
        let mut merger = ReviewMerger::new();
        merger.set_draft(MOVIE, "Loved it");
        let (ticket, _) = merger.begin_submit(MOVIE).unwrap();
        merger.complete(MOVIE, ticket, Review::new("Loved it"));

        // A refetch that already includes the new review still shows both copies
        let visible = merger.visible(MOVIE, &server_reviews());
        assert_eq!(visible.iter().filter(|r| r.text == "Loved it").count(), 2);
    }
}
