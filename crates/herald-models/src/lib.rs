pub mod item;
pub mod key;
pub mod quality;
pub mod webhook;

pub use item::{ContentKind, MediaItem, MediaSourceInfo, MediaStream, ProviderIds, StreamKind};
pub use key::LogicalKey;
pub use quality::{DynamicRange, QualitySignature, QualitySnapshot};
pub use webhook::WebhookPayload;
