// Comparison engine — pairwise authorship prediction over stored tweets.

pub mod compare;
pub mod store;

pub use compare::{Comparison, ComparisonEngine};
pub use store::{InMemoryTweetStore, StoredTweet, TweetStore};
