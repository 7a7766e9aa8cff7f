//! Visual asset resolution.
//!
//! Each image walks a fallback chain: the source's own image (cover only),
//! then the AI and stock tiers in hint order, then a curated static image.
//! A tier that errors or comes back empty hands over to the next one, so
//! resolution itself never fails.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};

use crate::draft::ArticleDraft;
use crate::traits::{ImageAsset, ImageGenerator, ImageStorage, ImageTier, StockPhotos};
use crate::unsplash::fallback_image;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[IMAGE:\s*([^\]]*?)\s*\]").expect("Invalid image placeholder regex")
});

/// Hint value that puts the stock tier ahead of AI generation.
pub const PREFER_STOCK: &str = "unsplash";

#[derive(Debug, Clone, Copy)]
pub struct ImageSpec<'a> {
    pub keyword: &'a str,
    pub preferred_source: Option<&'a str>,
    /// Only honored for the cover.
    pub source_image: Option<&'a str>,
    pub is_cover: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVisuals {
    pub cover: ImageAsset,
    /// Draft body with every placeholder replaced by a markdown image.
    pub content: String,
    pub inline: Vec<ImageAsset>,
}

/// The two API tiers in the order the hint asks for.
pub fn tier_order(preferred_source: Option<&str>) -> [ImageTier; 2] {
    if preferred_source == Some(PREFER_STOCK) {
        [ImageTier::Unsplash, ImageTier::Imagen]
    } else {
        [ImageTier::Imagen, ImageTier::Unsplash]
    }
}

pub fn placeholder_keywords(content: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(content)
        .map(|c| c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect()
}

/// Replace placeholders in order with `images`. Placeholders beyond the
/// supplied images are removed.
pub fn fill_placeholders(content: &str, images: &[ImageAsset]) -> String {
    let mut next = images.iter();
    PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| match next.next() {
            Some(image) => {
                let alt = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                format!("![{alt}]({})", image.url)
            }
            None => String::new(),
        })
        .into_owned()
}

pub struct VisualResolver {
    generator: Arc<dyn ImageGenerator>,
    stock: Arc<dyn StockPhotos>,
    storage: Arc<dyn ImageStorage>,
}

impl VisualResolver {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        stock: Arc<dyn StockPhotos>,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            generator,
            stock,
            storage,
        }
    }

    pub async fn resolve(&self, spec: ImageSpec<'_>) -> ImageAsset {
        let keyword = Some(spec.keyword.to_string()).filter(|k| !k.is_empty());

        if spec.is_cover {
            if let Some(url) = spec.source_image.filter(|u| !u.trim().is_empty()) {
                return ImageAsset {
                    url: url.to_string(),
                    tier: ImageTier::Source,
                    keyword,
                    is_cover: true,
                };
            }
        }

        for tier in tier_order(spec.preferred_source) {
            match self.try_tier(tier, spec.keyword).await {
                Ok(Some(url)) => {
                    info!(tier = tier.as_str(), keyword = spec.keyword, "Image resolved");
                    return ImageAsset {
                        url,
                        tier,
                        keyword,
                        is_cover: spec.is_cover,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(tier = tier.as_str(), keyword = spec.keyword, error = %e, "Image tier failed");
                }
            }
        }

        let url = {
            let mut rng = rand::rng();
            fallback_image(&mut rng)
        };
        warn!(keyword = spec.keyword, "All image tiers empty, using static fallback");
        ImageAsset {
            url: url.to_string(),
            tier: ImageTier::Fallback,
            keyword,
            is_cover: spec.is_cover,
        }
    }

    async fn try_tier(&self, tier: ImageTier, keyword: &str) -> anyhow::Result<Option<String>> {
        match tier {
            ImageTier::Imagen => match self.generator.generate(keyword).await? {
                Some(image) => Ok(Some(self.storage.store(image).await?)),
                None => Ok(None),
            },
            ImageTier::Unsplash => self.stock.search(keyword).await,
            ImageTier::Source | ImageTier::Fallback => Ok(None),
        }
    }

    /// Resolve the cover and every inline placeholder of a draft.
    pub async fn resolve_article(
        &self,
        draft: &ArticleDraft,
        preferred_source: Option<&str>,
        source_image: Option<&str>,
    ) -> ResolvedVisuals {
        let cover_keyword = draft
            .image_keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&draft.title);

        let cover = self
            .resolve(ImageSpec {
                keyword: cover_keyword,
                preferred_source,
                source_image,
                is_cover: true,
            })
            .await;

        let mut inline = Vec::new();
        for keyword in placeholder_keywords(&draft.content) {
            let keyword = if keyword.is_empty() {
                cover_keyword.to_string()
            } else {
                keyword
            };
            inline.push(
                self.resolve(ImageSpec {
                    keyword: &keyword,
                    preferred_source,
                    source_image: None,
                    is_cover: false,
                })
                .await,
            );
        }

        ResolvedVisuals {
            content: fill_placeholders(&draft.content, &inline),
            cover,
            inline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(url: &str) -> ImageAsset {
        ImageAsset {
            url: url.to_string(),
            tier: ImageTier::Unsplash,
            keyword: None,
            is_cover: false,
        }
    }

    #[test]
    fn finds_placeholders_in_order() {
        let body = "Intro\n[IMAGE: solar farm]\ntext [IMAGE:grid operators ] end";
        assert_eq!(placeholder_keywords(body), vec!["solar farm", "grid operators"]);
    }

    #[test]
    fn fills_placeholders_with_markdown_images() {
        let body = "A [IMAGE: one] B [IMAGE: two] C";
        let out = fill_placeholders(body, &[asset("https://i/1"), asset("https://i/2")]);
        assert_eq!(out, "A ![one](https://i/1) B ![two](https://i/2) C");
    }

    #[test]
    fn extra_placeholders_are_removed() {
        let out = fill_placeholders("x [IMAGE: a] y [IMAGE: b]", &[asset("https://i/1")]);
        assert_eq!(out, "x ![a](https://i/1) y ");
    }

    #[test]
    fn hint_reorders_api_tiers() {
        assert_eq!(
            tier_order(Some("unsplash")),
            [ImageTier::Unsplash, ImageTier::Imagen]
        );
        assert_eq!(tier_order(Some("imagen")), [ImageTier::Imagen, ImageTier::Unsplash]);
        assert_eq!(tier_order(None), [ImageTier::Imagen, ImageTier::Unsplash]);
    }
}
