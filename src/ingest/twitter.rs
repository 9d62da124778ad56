// Twitter API v2 client — bearer-token authenticated reads.
//
// Only two endpoints are needed: username lookup and the user tweet
// timeline. There is no retry or backoff here; a failed request fails the
// ingestion of that user and the caller decides what to do.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::source::{FetchedTweet, SourceUser, TweetSource};

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

/// Page size limits for /2/users/:id/tweets.
const MIN_PAGE_SIZE: usize = 5;
const MAX_PAGE_SIZE: usize = 100;

pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    /// Create a client for the given base URL (no trailing slash needed).
    pub fn new(base_url: &str, bearer_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("twitoff/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    /// GET an API path and deserialize the JSON response.
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "Twitter API GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Twitter API request failed: {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twitter API {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))
    }
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    data: Option<UserData>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<FetchedTweet>,
    #[serde(default)]
    meta: Option<TimelineMeta>,
}

#[derive(Debug, Deserialize)]
struct TimelineMeta {
    next_token: Option<String>,
}

#[async_trait]
impl TweetSource for TwitterClient {
    async fn fetch_user(&self, username: &str) -> Result<SourceUser> {
        let resp: UserLookupResponse = self
            .get(&format!("/2/users/by/username/{username}"), &[])
            .await?;

        match resp.data {
            Some(user) => Ok(SourceUser {
                id: Some(user.id),
                username: user.username,
            }),
            None => {
                let reason = resp
                    .errors
                    .first()
                    .and_then(|e| e.detail.clone().or_else(|| e.title.clone()))
                    .unwrap_or_else(|| "user not found".to_string());
                anyhow::bail!("Could not resolve @{username}: {reason}");
            }
        }
    }

    async fn fetch_timeline(
        &self,
        user: &SourceUser,
        since_id: Option<&str>,
        max_tweets: usize,
    ) -> Result<Vec<FetchedTweet>> {
        let user_id = user
            .id
            .as_deref()
            .with_context(|| format!("No Twitter id for @{}", user.username))?;
        let path = format!("/2/users/{user_id}/tweets");
        let page_size = max_tweets.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string();

        let mut tweets = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("max_results", &page_size),
                ("exclude", "replies,retweets"),
                ("tweet.fields", "created_at"),
            ];
            if let Some(since) = since_id {
                params.push(("since_id", since));
            }
            if let Some(ref token) = next_token {
                params.push(("pagination_token", token));
            }

            let page: TimelineResponse = self
                .get(&path, &params)
                .await
                .with_context(|| format!("Failed to fetch timeline for @{}", user.username))?;

            let page_len = page.data.len();
            tweets.extend(page.data);

            debug!(
                page_tweets = page_len,
                total_collected = tweets.len(),
                "Fetched page of tweets for @{}",
                user.username
            );

            next_token = page.meta.and_then(|m| m.next_token);
            if tweets.len() >= max_tweets || next_token.is_none() || page_len == 0 {
                break;
            }
        }

        tweets.truncate(max_tweets);

        info!(
            count = tweets.len(),
            username = %user.username,
            "Fetched tweets from Twitter API"
        );

        Ok(tweets)
    }
}
