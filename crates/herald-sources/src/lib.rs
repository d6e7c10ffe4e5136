pub mod enrich;
pub mod error;
pub mod jellyfin;
pub mod telegram;
pub mod traits;

pub use enrich::{MdblistClient, TmdbClient, YoutubeClient};
pub use error::SourceError;
pub use jellyfin::JellyfinClient;
pub use telegram::TelegramNotifier;
pub use traits::{DeliveryOutcome, EpisodeFilter, ItemPage, MediaServer, Notifier};
