//! Data models and structures
//!
//! Defines size profiles, source and variant images, the S3 trigger event,
//! and runtime configuration.

use aws_lambda_events::s3::{S3Bucket, S3Entity, S3EventRecord, S3Object};
use bytes::Bytes;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

pub use aws_lambda_events::s3::S3Event;

pub const DEFAULT_BUCKET_SUFFIX: &str = "-thumbs";
pub const DEFAULT_PROFILES: &str = "xs=50x50,sm=150x150,md=250x250,lg=500x500";
pub const DEFAULT_IO_TIMEOUT_SECS: u64 = 30;

/// Named bounding box a thumbnail must fit inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeProfile {
    pub name: String,
    pub max_width: u32,
    pub max_height: u32,
}

impl SizeProfile {
    pub fn new(name: impl Into<String>, max_width: u32, max_height: u32) -> Self {
        Self {
            name: name.into(),
            max_width,
            max_height,
        }
    }

    /// The four compiled-in profiles: xs, sm, md, lg.
    pub fn defaults() -> Vec<SizeProfile> {
        vec![
            SizeProfile::new("xs", 50, 50),
            SizeProfile::new("sm", 150, 150),
            SizeProfile::new("md", 250, 250),
            SizeProfile::new("lg", 500, 500),
        ]
    }

    /// Parse a list like `xs=50x50,sm=150x150`.
    pub fn parse_list(input: &str) -> crate::Result<Vec<SizeProfile>> {
        let mut profiles = Vec::new();
        let mut seen = HashSet::new();

        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let profile = Self::parse_one(entry)?;
            if !seen.insert(profile.name.clone()) {
                return Err(crate::Error::Configuration(format!(
                    "Duplicate size profile '{}'",
                    profile.name
                )));
            }
            profiles.push(profile);
        }

        if profiles.is_empty() {
            return Err(crate::Error::Configuration(
                "At least one size profile is required".to_string(),
            ));
        }

        Ok(profiles)
    }

    fn parse_one(entry: &str) -> crate::Result<SizeProfile> {
        let invalid = || {
            crate::Error::Configuration(format!(
                "Invalid size profile '{}'. Expected format: name=WIDTHxHEIGHT",
                entry
            ))
        };

        let (name, dims) = entry.split_once('=').ok_or_else(invalid)?;
        let (width, height) = dims.split_once('x').ok_or_else(invalid)?;
        let name = name.trim();
        let max_width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let max_height: u32 = height.trim().parse().map_err(|_| invalid())?;

        if name.is_empty() || max_width == 0 || max_height == 0 {
            return Err(invalid());
        }

        Ok(SizeProfile::new(name, max_width, max_height))
    }
}

/// Raster formats the pipeline accepts, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpg,
    Png,
}

impl ImageType {
    /// Case-sensitive: `JPG` and `jpeg` are not accepted.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "jpg" => Some(ImageType::Jpg),
            "png" => Some(ImageType::Png),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Jpg => "jpg",
            ImageType::Png => "png",
        }
    }

    pub fn format(&self) -> image::ImageFormat {
        match self {
            ImageType::Jpg => image::ImageFormat::Jpeg,
            ImageType::Png => image::ImageFormat::Png,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Bucket plus object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Downloaded source object with its inspected dimensions.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub dimensions: Dimensions,
}

/// One resized encoding of the source, produced for a single profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub profile_name: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub dimensions: Dimensions,
}

// S3 notification payload

/// Single-record `ObjectCreated:Put` notification, for tests and local invocation.
pub fn s3_event(bucket: &str, key: &str) -> S3Event {
    S3Event {
        records: vec![S3EventRecord {
            event_name: Some("ObjectCreated:Put".to_string()),
            event_source: Some("aws:s3".to_string()),
            s3: S3Entity {
                bucket: S3Bucket {
                    name: Some(bucket.to_string()),
                    ..Default::default()
                },
                object: S3Object {
                    key: Some(key.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }],
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket_suffix: String,
    pub profiles: Vec<SizeProfile>,
    pub allow_upscale: bool,
    pub io_timeout: Duration,
    pub s3_endpoint_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_suffix: DEFAULT_BUCKET_SUFFIX.to_string(),
            profiles: SizeProfile::defaults(),
            allow_upscale: true,
            io_timeout: Duration::from_secs(DEFAULT_IO_TIMEOUT_SECS),
            s3_endpoint_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket_suffix =
            lookup("THUMBNAIL_BUCKET_SUFFIX").unwrap_or_else(|| DEFAULT_BUCKET_SUFFIX.to_string());

        let profiles = SizeProfile::parse_list(
            &lookup("THUMBNAIL_PROFILES").unwrap_or_else(|| DEFAULT_PROFILES.to_string()),
        )?;

        let allow_upscale = match lookup("THUMBNAIL_ALLOW_UPSCALE") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                crate::Error::Configuration(format!(
                    "THUMBNAIL_ALLOW_UPSCALE must be true or false, got '{}'",
                    value
                ))
            })?,
            None => true,
        };

        let io_timeout_secs = match lookup("THUMBNAIL_IO_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    crate::Error::Configuration(format!(
                        "THUMBNAIL_IO_TIMEOUT_SECS must be a positive integer, got '{}'",
                        value
                    ))
                })?,
            None => DEFAULT_IO_TIMEOUT_SECS,
        };

        Ok(Self {
            bucket_suffix,
            profiles,
            allow_upscale,
            io_timeout: Duration::from_secs(io_timeout_secs),
            s3_endpoint_url: lookup("S3_ENDPOINT_URL").filter(|url| !url.trim().is_empty()),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_profiles_match_reference_sizes() {
        let profiles = SizeProfile::defaults();
        assert_eq!(
            profiles,
            vec![
                SizeProfile::new("xs", 50, 50),
                SizeProfile::new("sm", 150, 150),
                SizeProfile::new("md", 250, 250),
                SizeProfile::new("lg", 500, 500),
            ]
        );
        assert_eq!(SizeProfile::parse_list(DEFAULT_PROFILES).unwrap(), profiles);
    }

    #[test]
    fn test_parse_profile_list() {
        let profiles = SizeProfile::parse_list(" icon=16x16 , banner=1200x300 ").unwrap();
        assert_eq!(
            profiles,
            vec![
                SizeProfile::new("icon", 16, 16),
                SizeProfile::new("banner", 1200, 300),
            ]
        );
    }

    #[test]
    fn test_parse_profile_list_rejects_bad_entries() {
        assert!(SizeProfile::parse_list("").is_err());
        assert!(SizeProfile::parse_list("xs=50").is_err());
        assert!(SizeProfile::parse_list("xs=0x50").is_err());
        assert!(SizeProfile::parse_list("=50x50").is_err());
        assert!(SizeProfile::parse_list("xs=axb").is_err());

        let err = SizeProfile::parse_list("xs=50x50,xs=60x60").unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_image_type_is_case_sensitive() {
        assert_eq!(ImageType::from_extension("jpg"), Some(ImageType::Jpg));
        assert_eq!(ImageType::from_extension("png"), Some(ImageType::Png));
        assert_eq!(ImageType::from_extension("JPG"), None);
        assert_eq!(ImageType::from_extension("jpeg"), None);
        assert_eq!(ImageType::from_extension("gif"), None);
    }

    #[test]
    fn test_s3_event_deserialization() {
        let json = r#"{
            "Records": [
                {
                    "eventVersion": "2.1",
                    "eventSource": "aws:s3",
                    "awsRegion": "us-east-1",
                    "eventTime": "2024-05-01T12:00:00.000Z",
                    "eventName": "ObjectCreated:Put",
                    "userIdentity": {"principalId": "AWS:EXAMPLE"},
                    "requestParameters": {"sourceIPAddress": "127.0.0.1"},
                    "responseElements": {
                        "x-amz-request-id": "EXAMPLE123456789",
                        "x-amz-id-2": "EXAMPLE123/abcdefgh"
                    },
                    "s3": {
                        "s3SchemaVersion": "1.0",
                        "configurationId": "thumbnails",
                        "bucket": {
                            "name": "images",
                            "ownerIdentity": {"principalId": "EXAMPLE"},
                            "arn": "arn:aws:s3:::images"
                        },
                        "object": {
                            "key": "my+cat%21.png",
                            "size": 1024,
                            "eTag": "0123456789abcdef0123456789abcdef",
                            "sequencer": "0A1B2C3D4E5F678901"
                        }
                    }
                }
            ]
        }"#;

        let event: S3Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].s3.bucket.name.as_deref(), Some("images"));
        assert_eq!(
            event.records[0].s3.object.key.as_deref(),
            Some("my+cat%21.png")
        );
        assert_eq!(event.records[0].s3.object.size, Some(1024));
    }

    #[test]
    fn test_s3_event_helper_builds_single_record() {
        let event = s3_event("images", "cat.png");
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].s3.bucket.name.as_deref(), Some("images"));
        assert_eq!(event.records[0].s3.object.key.as_deref(), Some("cat.png"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bucket_suffix, "-thumbs");
        assert_eq!(config.profiles, SizeProfile::defaults());
        assert!(config.allow_upscale);
        assert_eq!(config.io_timeout, Duration::from_secs(30));
        assert!(config.s3_endpoint_url.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("THUMBNAIL_BUCKET_SUFFIX", "-small"),
            ("THUMBNAIL_PROFILES", "xs=10x10"),
            ("THUMBNAIL_ALLOW_UPSCALE", "false"),
            ("THUMBNAIL_IO_TIMEOUT_SECS", "5"),
            ("S3_ENDPOINT_URL", "http://localhost:9000"),
        ]))
        .unwrap();

        assert_eq!(config.bucket_suffix, "-small");
        assert_eq!(config.profiles, vec![SizeProfile::new("xs", 10, 10)]);
        assert!(!config.allow_upscale);
        assert_eq!(config.io_timeout, Duration::from_secs(5));
        assert_eq!(
            config.s3_endpoint_url.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("THUMBNAIL_ALLOW_UPSCALE", "maybe")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("THUMBNAIL_IO_TIMEOUT_SECS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("THUMBNAIL_PROFILES", "nope")])).is_err());
    }
}
