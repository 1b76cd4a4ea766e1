pub mod assets;
pub mod dispatcher;
pub mod intake;
pub mod providers;
pub mod recommendations;
pub mod results;
pub mod reviews;
pub mod title_search;

pub use assets::ImageResolver;
pub use dispatcher::{DeliveredResult, DispatchStatus, RecommendationDispatcher};
pub use intake::{submit_new_movie, ImageAttachment, MovieDraft, MovieIntakeValidator, MovieUpload};
pub use providers::{HttpBackend, MovieBackend};
pub use recommendations::{RecommendationController, SubmitOutcome};
pub use results::filter_placeholders;
pub use reviews::{PostStatus, ReviewMerger};
pub use title_search::{ReviewSubmit, SearchController, SearchOutcome};
