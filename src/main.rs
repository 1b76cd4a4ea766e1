use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_feels::{
    config::Config,
    error::ValidationError,
    models::{MoodVocabulary, MovieId, MovieRecord, Preference, Toggle},
    services::{
        submit_new_movie, DeliveredResult, HttpBackend, ImageAttachment, ImageResolver,
        MovieBackend, MovieDraft, RecommendationController, ReviewSubmit, SearchController,
        SearchOutcome, SubmitOutcome,
    },
};

/// Mood-based movie recommendations and community reviews
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Movie backend base URL
    #[arg(long, env = "MOVIE_FEELS_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the moods that can be selected
    Moods,
    /// Ask for recommendations for how you feel
    Recommend {
        /// Mood to select (up to 5)
        #[arg(short, long = "mood", required = true)]
        moods: Vec<String>,
        /// congruence or incongruence
        #[arg(short, long)]
        preference: Preference,
        /// Anything else about how you are feeling
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Search stored movies by title
    Search { title: String },
    /// Search for a movie and post a review on one of the matches
    Review {
        #[arg(long)]
        title: String,
        #[arg(long)]
        movie: i64,
        #[arg(long)]
        text: String,
    },
    /// Add a new movie together with its first review
    Add {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        review: String,
        #[arg(short, long = "mood", required = true)]
        moods: Vec<String>,
    },
    /// Check that the backend is up
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_feels=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }

    tracing::debug!(backend_url = %config.backend_url, "Configuration loaded");

    let backend: Arc<dyn MovieBackend> = Arc::new(HttpBackend::from_config(&config)?);
    let vocabulary = MoodVocabulary::new(config.moods.clone());
    let images = ImageResolver::from_config(&config);

    match args.command {
        Command::Moods => list_moods(backend, &vocabulary).await,
        Command::Recommend {
            moods,
            preference,
            notes,
        } => {
            recommend(backend, &config, &vocabulary, &images, moods, preference, notes).await
        }
        Command::Search { title } => {
            let controller = SearchController::new(backend);
            let outcome = controller.search(&title).await?;
            print_outcome(&outcome, &images);
            Ok(())
        }
        Command::Review { title, movie, text } => {
            post_review(backend, &images, &title, MovieId(movie), text).await
        }
        Command::Add {
            image,
            title,
            description,
            review,
            moods,
        } => {
            let mut draft = MovieDraft::new();
            draft.image = Some(ImageAttachment::from_path(&image).await?);
            draft.title = title;
            draft.description = description;
            draft.review = review;
            for name in moods {
                let mood = vocabulary.resolve(&name)?;
                if draft.toggle_mood(mood) == Toggle::AtCapacity {
                    bail!(ValidationError::TooManyMoods);
                }
            }

            match submit_new_movie(backend, draft).await {
                Ok(movie) => {
                    println!("Movie review submitted successfully!");
                    print_record(&movie, &images);
                    Ok(())
                }
                Err(e) => bail!(e.notice()),
            }
        }
        Command::Health => {
            let health = backend.health().await?;
            println!("{}: {}", health.status, health.message);
            Ok(())
        }
    }
}

async fn list_moods(backend: Arc<dyn MovieBackend>, vocabulary: &MoodVocabulary) -> Result<()> {
    match backend.fetch_moods().await {
        Ok(moods) => {
            for mood in moods {
                println!("{}", mood.name);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not fetch moods, using configured list");
            for mood in vocabulary.moods() {
                println!("{}", mood);
            }
        }
    }
    Ok(())
}

async fn recommend(
    backend: Arc<dyn MovieBackend>,
    config: &Config,
    vocabulary: &MoodVocabulary,
    images: &ImageResolver,
    moods: Vec<String>,
    preference: Preference,
    notes: String,
) -> Result<()> {
    let controller = RecommendationController::new(backend, config.reveal_delay());
    controller.enter().await;

    for name in moods {
        let mood = vocabulary.resolve(&name)?;
        if controller.toggle_mood(mood.clone()).await == Some(Toggle::AtCapacity) {
            tracing::warn!(mood = %mood, "Selection is full, mood ignored");
        }
    }
    controller.select_preference(preference).await;
    controller.set_notes(notes).await;

    match controller.submit().await {
        Ok(SubmitOutcome::Delivered { .. }) => {}
        Ok(SubmitOutcome::Blocked) => bail!(ValidationError::IncompleteSelection),
        Ok(other) => bail!("Recommendation request not sent: {:?}", other),
        Err(e) => bail!(e.notice()),
    }

    match controller.wait_for_reveal().await {
        Some(result) => print_result(&result, images),
        None => println!("No recommendations found."),
    }

    Ok(())
}

async fn post_review(
    backend: Arc<dyn MovieBackend>,
    images: &ImageResolver,
    title: &str,
    movie_id: MovieId,
    text: String,
) -> Result<()> {
    let controller = SearchController::new(backend);
    let outcome = controller.search(title).await?;
    if outcome.movies().iter().all(|m| m.id != movie_id) {
        print_outcome(&outcome, images);
        bail!("Movie {} is not among the results for '{}'", movie_id, title);
    }

    controller.set_draft(movie_id, text).await;
    match controller.submit_review(movie_id).await {
        Ok(ReviewSubmit::Posted(_)) => {}
        Ok(ReviewSubmit::Skipped) => bail!("Review text is empty"),
        Ok(ReviewSubmit::Discarded) => bail!("Review response arrived too late"),
        Err(e) => bail!(e.notice()),
    }

    println!("Reviews:");
    for review in controller.visible_reviews(movie_id).await.unwrap_or_default() {
        println!("  - {}", review.text);
    }
    Ok(())
}

fn print_result(result: &DeliveredResult, images: &ImageResolver) {
    if !result.message.is_empty() {
        println!("{}", result.message);
    }
    if result.movies.is_empty() {
        println!("No recommendations found.");
        return;
    }

    for movie in &result.movies {
        println!();
        println!("{}", movie.title);
        println!("  {}", movie.description);
        if let Some(image) = &movie.image_url {
            println!("  Image: {}", images.resolve(image));
        }
        let moods: Vec<&str> = movie.moods.iter().map(|m| m.as_str()).collect();
        println!("  Moods: {}", moods.join(", "));
        if movie.reviews.is_empty() {
            println!("  No reviews yet.");
        } else {
            println!("  Reviews:");
            for review in &movie.reviews {
                println!("    - {}", review);
            }
        }
    }
}

fn print_outcome(outcome: &SearchOutcome, images: &ImageResolver) {
    match outcome {
        SearchOutcome::Found(movies) => {
            for movie in movies {
                print_record(movie, images);
            }
        }
        SearchOutcome::NotFound { query } => {
            println!("{}", query);
            println!("Movie not found in our database.");
        }
        SearchOutcome::TransportError { query, .. } => {
            println!("{}", query);
            println!("An error occurred while searching for this movie. Please try again later.");
        }
    }
}

fn print_record(movie: &MovieRecord, images: &ImageResolver) {
    println!();
    println!("[{}] {}", movie.id, movie.title);
    if let Some(image) = &movie.image_url {
        println!("  Image: {}", images.resolve(image));
    }
    println!("  Description: {}", movie.description);
    for review in &movie.reviews {
        println!("  Review: {}", review.text);
    }
    let posted = movie
        .created_at
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!("  Posted on: {}", posted);
}
