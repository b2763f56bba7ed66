pub mod models;
pub mod traits;
pub mod url;
pub mod ytdlp;

pub use models::{format_duration, Format, PlaylistEntry, Thumbnail, VideoInfo};
pub use traits::Extractor;
pub use url::{expand_requests, is_playlist_url, is_supported_url};
pub use ytdlp::YtDlpExtractor;
