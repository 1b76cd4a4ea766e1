use crate::models::MovieMatch;

/// Drops unranked movies from a recommendation result
///
/// Movies carrying the placeholder score are removed, unless every movie
/// carries it, in which case the list is returned untouched so the user still
/// sees something. Order is preserved either way.
pub fn filter_placeholders(movies: Vec<MovieMatch>) -> Vec<MovieMatch> {
    let all_placeholder = movies.iter().all(|m| m.match_score.is_placeholder());
    if all_placeholder {
        return movies;
    }

    let before = movies.len();
    let kept: Vec<MovieMatch> = movies
        .into_iter()
        .filter(|m| !m.match_score.is_placeholder())
        .collect();

    tracing::debug!(
        received = before,
        kept = kept.len(),
        "Filtered placeholder-scored movies"
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchScore, MovieId};

    fn movie(id: i64, score: f64) -> MovieMatch {
        MovieMatch {
            id: MovieId(id),
            title: format!("Movie {}", id),
            description: String::new(),
            image_url: None,
            moods: vec![],
            reviews: vec![],
            match_score: MatchScore::from(score),
        }
    }

    fn scores(movies: &[MovieMatch]) -> Vec<f64> {
        movies.iter().map(|m| f64::from(m.match_score)).collect()
    }

    #[test]
    fn test_all_placeholders_are_kept() {
        let output = filter_placeholders(vec![movie(1, 1.0), movie(2, 1.0), movie(3, 1.0)]);
        assert_eq!(output.len(), 3);
        assert_eq!(scores(&output), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_placeholders_dropped_when_real_scores_exist() {
        let output = filter_placeholders(vec![movie(1, 1.0), movie(2, 0.8), movie(3, 0.3)]);
        assert_eq!(scores(&output), vec![0.8, 0.3]);
        assert_eq!(output[0].id, MovieId(2));
    }

    #[test]
    fn test_order_is_not_resorted() {
        let output = filter_placeholders(vec![movie(1, 0.2), movie(2, 1.0), movie(3, 0.9)]);
        assert_eq!(scores(&output), vec![0.2, 0.9]);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_placeholders(vec![]).is_empty());
    }
}
