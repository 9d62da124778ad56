// Ingestion — fetch tweets per username and write them to the store.
//
// The comparison engine never touches the network; everything it reads
// was committed here first.

pub mod file;
pub mod source;
pub mod twitter;
pub mod update;

pub use source::{FetchedTweet, SourceUser, TweetSource};
pub use update::{add_or_update_user, update_all_users, IngestReport};
