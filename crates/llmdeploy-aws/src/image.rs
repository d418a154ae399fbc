//! Serving container image resolution.
//!
//! Maps a serving framework and version to the regional Deep Learning
//! Container URI published by AWS, e.g.
//! `763104351884.dkr.ecr.eu-central-1.amazonaws.com/huggingface-pytorch-tgi-inference:2.3.0-tgi2.2.0-gpu-py310-cu121-ubuntu22.04-v2.0`.

use crate::error::{CloudError, CloudResult};

/// Framework name for the Hugging Face TGI backend.
pub const HUGGINGFACE_FRAMEWORK: &str = "huggingface";

/// TGI release deployed by default.
pub const TGI_VERSION: &str = "2.2.0";

const TGI_REPOSITORY: &str = "huggingface-pytorch-tgi-inference";

/// TGI release to image tag, oldest first.
const TGI_TAGS: &[(&str, &str)] = &[
    ("1.4.2", "2.1.1-tgi1.4.2-gpu-py310-cu121-ubuntu22.04"),
    ("1.4.5", "2.1.1-tgi1.4.5-gpu-py310-cu121-ubuntu22.04"),
    ("2.0.0", "2.1.1-tgi2.0.0-gpu-py310-cu121-ubuntu22.04"),
    ("2.0.1", "2.1.1-tgi2.0.1-gpu-py310-cu121-ubuntu22.04"),
    ("2.0.2", "2.3.0-tgi2.0.2-gpu-py310-cu121-ubuntu22.04"),
    ("2.2.0", "2.3.0-tgi2.2.0-gpu-py310-cu121-ubuntu22.04-v2.0"),
];

const DEFAULT_REGISTRY: &str = "763104351884";

const DEFAULT_REGISTRY_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-north-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

const REGIONAL_REGISTRIES: &[(&str, &str)] = &[
    ("af-south-1", "626614931356"),
    ("ap-east-1", "871362719292"),
    ("ap-south-2", "772153158452"),
    ("ap-southeast-3", "907027046896"),
    ("ap-southeast-4", "457447274322"),
    ("ca-west-1", "204538143572"),
    ("cn-north-1", "727897471807"),
    ("cn-northwest-1", "727897471807"),
    ("eu-central-2", "380420809688"),
    ("eu-south-1", "692866216735"),
    ("eu-south-2", "503227376785"),
    ("il-central-1", "780543022126"),
    ("me-central-1", "914824155844"),
    ("me-south-1", "217643126080"),
    ("us-gov-east-1", "446045086412"),
    ("us-gov-west-1", "442386744353"),
];

/// A request for a serving image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageQuery {
    /// Serving framework (backend) name.
    pub framework: String,
    /// Framework release, either exact (`2.2.0`) or `major.minor` (`2.2`).
    pub version: String,
}

impl ImageQuery {
    /// Creates a query.
    #[must_use]
    pub fn new(framework: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            version: version.into(),
        }
    }

    /// The Hugging Face TGI image the deployer uses.
    #[must_use]
    pub fn huggingface_tgi() -> Self {
        Self::new(HUGGINGFACE_FRAMEWORK, TGI_VERSION)
    }
}

/// Resolve the image URI for `query` in `region`.
pub fn huggingface_llm_image_uri(region: &str, query: &ImageQuery) -> CloudResult<String> {
    if query.framework != HUGGINGFACE_FRAMEWORK {
        return Err(CloudError::UnsupportedImage(format!(
            "framework '{}' (expected '{HUGGINGFACE_FRAMEWORK}')",
            query.framework
        )));
    }

    let tag = tgi_tag(&query.version).ok_or_else(|| {
        CloudError::UnsupportedImage(format!("{} version '{}'", query.framework, query.version))
    })?;
    let registry = registry_account(region).ok_or_else(|| {
        CloudError::UnsupportedImage(format!("no {} images in region '{region}'", query.framework))
    })?;

    Ok(format!(
        "{registry}.dkr.ecr.{region}.{}/{TGI_REPOSITORY}:{tag}",
        domain(region)
    ))
}

fn tgi_tag(version: &str) -> Option<&'static str> {
    if let Some((_, tag)) = TGI_TAGS.iter().find(|(v, _)| *v == version) {
        return Some(*tag);
    }

    // `major.minor` resolves to the newest matching patch release.
    if version.split('.').count() == 2 {
        let prefix = format!("{version}.");
        return TGI_TAGS
            .iter()
            .rev()
            .find(|(v, _)| v.starts_with(&prefix))
            .map(|(_, tag)| *tag);
    }

    None
}

fn registry_account(region: &str) -> Option<&'static str> {
    if DEFAULT_REGISTRY_REGIONS.contains(&region) {
        return Some(DEFAULT_REGISTRY);
    }
    REGIONAL_REGISTRIES
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, account)| *account)
}

fn domain(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_query_in_frankfurt() {
        let uri = huggingface_llm_image_uri("eu-central-1", &ImageQuery::huggingface_tgi()).unwrap();
        assert_eq!(
            uri,
            "763104351884.dkr.ecr.eu-central-1.amazonaws.com/huggingface-pytorch-tgi-inference:2.3.0-tgi2.2.0-gpu-py310-cu121-ubuntu22.04-v2.0"
        );
    }

    #[rstest]
    #[case("us-east-1", "763104351884.dkr.ecr.us-east-1.amazonaws.com")]
    #[case("af-south-1", "626614931356.dkr.ecr.af-south-1.amazonaws.com")]
    #[case("cn-north-1", "727897471807.dkr.ecr.cn-north-1.amazonaws.com.cn")]
    #[case("us-gov-west-1", "442386744353.dkr.ecr.us-gov-west-1.amazonaws.com")]
    fn registry_host_per_region(#[case] region: &str, #[case] host: &str) {
        let uri = huggingface_llm_image_uri(region, &ImageQuery::huggingface_tgi()).unwrap();
        assert!(uri.starts_with(&format!("{host}/")), "{uri}");
    }

    #[test]
    fn minor_version_picks_latest_patch() {
        let uri = huggingface_llm_image_uri("us-west-2", &ImageQuery::new("huggingface", "2.0")).unwrap();
        assert!(uri.ends_with(":2.3.0-tgi2.0.2-gpu-py310-cu121-ubuntu22.04"));
    }

    #[test]
    fn unknown_framework_is_rejected() {
        let err = huggingface_llm_image_uri("us-east-1", &ImageQuery::new("lmi", "0.28.0")).unwrap_err();
        assert!(matches!(err, CloudError::UnsupportedImage(_)));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = huggingface_llm_image_uri("us-east-1", &ImageQuery::new("huggingface", "9.9.9")).unwrap_err();
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn unknown_region_is_rejected() {
        let err = huggingface_llm_image_uri("mars-north-1", &ImageQuery::huggingface_tgi()).unwrap_err();
        assert!(err.to_string().contains("mars-north-1"));
    }
}
