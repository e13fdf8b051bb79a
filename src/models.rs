// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "plan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Inactive,
    Active,
    Cancelled,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub phone_number: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub promo_notifications: bool,
    pub current_plan_id: Option<i64>,
    pub plan_status: PlanStatus,
    pub plan_renewal_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan_id: Option<i64>,
    pub status: PlanStatus,
    pub renewal_date: Option<NaiveDate>,
    pub price_override: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Plan {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub currency: String,
    pub price: Decimal,
    pub billing_period: String,
    pub badge_text: String,
    pub button_text: String,
    pub is_active: bool,
    pub is_recommended: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A feature assignment joined with the feature's name.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct PlanFeatureLine {
    pub plan_id: i64,
    pub feature_id: i64,
    pub name: String,
    pub is_included: bool,
    pub display_order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub display_order: i32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "movie_quality", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    Sd,
    Hd,
    Fhd,
    Uhd,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Sd, Quality::Hd, Quality::Fhd, Quality::Uhd];

    pub fn code(&self) -> &'static str {
        match self {
            Quality::Sd => "SD",
            Quality::Hd => "HD",
            Quality::Fhd => "FHD",
            Quality::Uhd => "UHD",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Sd => "SD (480p)",
            Quality::Hd => "HD (720p)",
            Quality::Fhd => "Full HD (1080p)",
            Quality::Uhd => "4K Ultra HD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Quality::ALL
            .into_iter()
            .find(|q| q.code().eq_ignore_ascii_case(code.trim()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct DownloadOption {
    pub label: String,
    pub badge: String,
    pub resolution: String,
    pub file_size: String,
    pub file_format: String,
    pub bitrate: String,
    pub download_url: String,
    pub cta_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct ServerOption {
    pub name: String,
    pub badge: String,
    pub badge_variant: String,
    pub description: String,
    pub speed: String,
    pub active_users: String,
    pub url: String,
    pub cta_text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub tagline: String,
    pub description: String,
    pub poster_url: String,
    pub banner_url: String,
    pub release_year: i32,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: i32,
    pub rating: Option<Decimal>,
    pub imdb_rating: Option<Decimal>,
    pub download_url: String,
    pub download_options: Option<Json<Vec<DownloadOption>>>,
    pub server_options: Option<Json<Vec<ServerOption>>>,
    pub trailer_url: String,
    pub is_trending: bool,
    pub is_featured: bool,
    pub screenshots: Json<Vec<String>>,
    pub quality: Option<Quality>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn absolute_url(&self) -> String {
        format!("/movies/{}", self.slug)
    }

    pub fn download_page_url(&self) -> String {
        format!("/movies/{}/download", self.slug)
    }

    /// The stored direct link, or the movie's download page.
    pub fn resolved_download_url(&self) -> String {
        if self.download_url.is_empty() {
            self.download_page_url()
        } else {
            self.download_url.clone()
        }
    }

    pub fn resolved_download_options(&self) -> Vec<DownloadOption> {
        match &self.download_options {
            Some(Json(options)) if !options.is_empty() => options.clone(),
            _ => vec![DownloadOption {
                label: "Full HD (1080p)".to_string(),
                badge: "Popular".to_string(),
                resolution: "1920 x 1080".to_string(),
                file_size: "2-4 GB".to_string(),
                file_format: "MP4 / MKV".to_string(),
                bitrate: "8-12 Mbps".to_string(),
                download_url: self.resolved_download_url(),
                cta_text: "Download 1080p".to_string(),
            }],
        }
    }

    pub fn resolved_server_options(&self) -> Vec<ServerOption> {
        match &self.server_options {
            Some(Json(options)) if !options.is_empty() => options.clone(),
            _ => vec![ServerOption {
                name: "Server 1 - Direct Download".to_string(),
                badge: "Fast".to_string(),
                badge_variant: "success".to_string(),
                description: "Direct download link - No waiting".to_string(),
                speed: "10 MB/s".to_string(),
                active_users: "1,234".to_string(),
                url: self.resolved_download_url(),
                cta_text: "Select Server 1".to_string(),
            }],
        }
    }
}

/// Category or language attached to a movie.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct MovieCard {
    #[serde(flatten)]
    pub movie: Movie,
    pub categories: Vec<Tag>,
    pub languages: Vec<Tag>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Language {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Comment {
    pub id: i64,
    pub movie_id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub body: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Download history row joined with the movie it points at.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct DownloadEntry {
    pub id: i64,
    pub movie_id: i64,
    pub title: String,
    pub slug: String,
    pub poster_url: String,
    pub quality: Option<Quality>,
    pub downloaded_at: DateTime<Utc>,
}

/// Favorite row joined with the movie it points at.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct FavoriteEntry {
    pub id: i64,
    pub movie_id: i64,
    pub title: String,
    pub slug: String,
    pub poster_url: String,
    pub release_year: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(download_url: &str) -> Movie {
        Movie {
            id: 1,
            title: "Arrival".to_string(),
            slug: "arrival".to_string(),
            tagline: String::new(),
            description: "Linguist meets heptapods.".to_string(),
            poster_url: String::new(),
            banner_url: String::new(),
            release_year: 2016,
            release_date: None,
            duration_minutes: 116,
            rating: None,
            imdb_rating: None,
            download_url: download_url.to_string(),
            download_options: None,
            server_options: Some(Json(Vec::new())),
            trailer_url: String::new(),
            is_trending: false,
            is_featured: false,
            screenshots: Json(Vec::new()),
            quality: Some(Quality::Fhd),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn download_url_falls_back_to_download_page() {
        assert_eq!(movie("").resolved_download_url(), "/movies/arrival/download");
        assert_eq!(
            movie("https://cdn.example/arrival.mkv").resolved_download_url(),
            "https://cdn.example/arrival.mkv"
        );
    }

    #[test]
    fn missing_or_empty_option_lists_use_defaults() {
        let m = movie("");
        let downloads = m.resolved_download_options();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].download_url, "/movies/arrival/download");

        let servers = m.resolved_server_options();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "Server 1 - Direct Download");
    }

    #[test]
    fn stored_option_lists_win() {
        let mut m = movie("");
        m.download_options = Some(Json(vec![DownloadOption {
            label: "4K".to_string(),
            ..Default::default()
        }]));
        assert_eq!(m.resolved_download_options()[0].label, "4K");
    }

    #[test]
    fn quality_codes_parse_case_insensitively() {
        assert_eq!(Quality::from_code("fhd"), Some(Quality::Fhd));
        assert_eq!(Quality::from_code(" UHD "), Some(Quality::Uhd));
        assert_eq!(Quality::from_code("8K"), None);
        assert_eq!(serde_json::to_value(Quality::Hd).unwrap(), "HD");
    }
}
