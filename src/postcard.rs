//! Postcard composer.
//!
//! Loads a taxon photo, lays it out on a fixed canvas with the common and
//! scientific names, and produces a PNG named after the common name.

use crate::rendering::layout::{centered_text_x, fit_centered, fit_text_scale};
use crate::rendering::raster::{encode_png, rasterize};
use crate::rendering::{
    CanvasSize, DisplayList, PaintCommand, RenderedImage, TextStyle, SHADOW, TEXT_GREY, WHITE,
};
use crate::view::TaxonCard;
use crate::{Error, Result};
use base64::Engine as Base64Engine;
use image::{DynamicImage, GenericImageView};
use reqwest::Client;
use std::path::{Path, PathBuf};

/// File name suffix variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PostcardStyle {
    /// `<Name>_postcard.png`
    #[default]
    Postcard,
    /// `<Name>_card.png`
    Card,
}

impl PostcardStyle {
    fn suffix(self) -> &'static str {
        match self {
            PostcardStyle::Postcard => "_postcard.png",
            PostcardStyle::Card => "_card.png",
        }
    }
}

/// Layout switches.
#[derive(Debug, Clone, PartialEq)]
pub struct PostcardOptions {
    pub size: CanvasSize,
    /// Share of the canvas the photo may take in each dimension
    pub image_fraction: f64,
    pub shadow: bool,
    pub show_category: bool,
    pub style: PostcardStyle,
}

impl Default for PostcardOptions {
    fn default() -> Self {
        Self {
            size: CanvasSize::default(),
            image_fraction: 0.7,
            shadow: true,
            show_category: false,
            style: PostcardStyle::Postcard,
        }
    }
}

/// What goes on one postcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostcardSpec {
    pub common_name: String,
    pub scientific_name: String,
    pub image_url: String,
    pub category: Option<String>,
}

impl PostcardSpec {
    /// Build from a rendered card, using the same photo the card shows
    /// (the placeholder when the taxon has none).
    pub fn from_card(card: &TaxonCard) -> Self {
        Self {
            common_name: card.common_name.clone(),
            scientific_name: card.scientific_name.clone(),
            image_url: card.display_photo_url().to_string(),
            category: card.category.clone().or_else(|| Some(card.rank.clone())),
        }
    }
}

/// A finished postcard.
#[derive(Debug, Clone)]
pub struct Postcard {
    pub file_name: String,
    pub image: RenderedImage,
}

impl Postcard {
    pub fn png(&self) -> &[u8] {
        &self.image.png_data
    }

    /// `data:image/png;base64,...`
    pub fn data_url(&self) -> String {
        let b64 = Base64Engine::encode(&base64::engine::general_purpose::STANDARD, self.png());
        format!("data:image/png;base64,{}", b64)
    }

    /// Write the PNG into `dir` under its file name and return the full path.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.png())?;
        log::info!("saved postcard {}", path.display());
        Ok(path)
    }
}

/// `Bald Eagle` → `Bald_Eagle_postcard.png`. Whitespace runs and path
/// separators become `_`.
pub fn file_name_for(common_name: &str, style: PostcardStyle) -> String {
    let mut stem = String::with_capacity(common_name.len());
    let mut in_space = false;
    for c in common_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            '/' | '\\' | ':' | '\0' => stem.push('_'),
            c => stem.push(c),
        }
    }
    if stem.is_empty() {
        stem.push_str("untitled");
    }
    stem.push_str(style.suffix());
    stem
}

/// Display list for a postcard whose photo is `photo_width`×`photo_height`.
pub fn layout_postcard(
    spec: &PostcardSpec,
    photo_width: u32,
    photo_height: u32,
    options: &PostcardOptions,
) -> Result<DisplayList> {
    let size = options.size;
    let rect = fit_centered(photo_width, photo_height, size, options.image_fraction)
        .ok_or_else(|| Error::RenderError(format!("image {} has no pixels", spec.image_url)))?;

    let mut list = DisplayList::new(size);
    list.push(PaintCommand::Fill { rgba: WHITE });

    if options.shadow {
        list.push(PaintCommand::Shadow {
            rect,
            rgba: SHADOW,
            blur: 20.0,
            offset: (0, 10),
        });
        list.push(PaintCommand::SolidRect { rect, rgba: WHITE });
    }
    list.push(PaintCommand::Image { rect });

    let max_text_width = size.width.saturating_sub(20);
    let height = size.height as i32;
    let mut labels = vec![
        (spec.common_name.as_str(), 3, TextStyle::Bold, height - 350),
        (spec.scientific_name.as_str(), 2, TextStyle::Italic, height - 30),
    ];
    if options.show_category {
        if let Some(category) = spec.category.as_deref() {
            labels.push((category, 1, TextStyle::Regular, height - 8));
        }
    }

    for (text, preferred, style, baseline) in labels {
        let scale = fit_text_scale(text, preferred, max_text_width);
        list.push(PaintCommand::Text {
            x: centered_text_x(text, scale, size),
            baseline,
            text: text.to_string(),
            scale,
            style,
            rgba: TEXT_GREY,
        });
    }

    Ok(list)
}

/// Compose a postcard from an already decoded photo.
pub fn compose(spec: &PostcardSpec, photo: &DynamicImage, options: &PostcardOptions) -> Result<Postcard> {
    let (width, height) = photo.dimensions();
    let list = layout_postcard(spec, width, height, options)?;
    let canvas = rasterize(&list, Some(photo))?;
    let image = encode_png(&canvas)?;
    Ok(Postcard {
        file_name: file_name_for(&spec.common_name, options.style),
        image,
    })
}

/// Loads photos over HTTP and composes postcards.
#[derive(Debug, Clone)]
pub struct PostcardComposer {
    http: Client,
    options: PostcardOptions,
}

impl PostcardComposer {
    pub fn new(http: Client, options: PostcardOptions) -> Self {
        Self { http, options }
    }

    pub fn options(&self) -> &PostcardOptions {
        &self.options
    }

    /// Fetch and decode the photo. Any failure is reported as `ImageLoad`.
    pub async fn load_image(&self, url: &str) -> Result<DynamicImage> {
        let bytes = crate::api::fetch_bytes(&self.http, url)
            .await
            .map_err(|e| Error::ImageLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        image::load_from_memory(&bytes).map_err(|e| Error::ImageLoad {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    pub async fn create(&self, spec: &PostcardSpec) -> Result<Postcard> {
        let photo = self.load_image(&spec.image_url).await?;
        let (width, height) = photo.dimensions();
        log::debug!(
            "composing postcard for '{}' from {}x{} photo",
            spec.common_name,
            width,
            height
        );
        compose(spec, &photo, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn spec() -> PostcardSpec {
        PostcardSpec {
            common_name: "Bald Eagle".into(),
            scientific_name: "Haliaeetus leucocephalus".into(),
            image_url: "https://example.invalid/eagle.jpg".into(),
            category: Some("Aves".into()),
        }
    }

    #[test]
    fn file_names_follow_common_name() {
        assert_eq!(file_name_for("Bald Eagle", PostcardStyle::Postcard), "Bald_Eagle_postcard.png");
        assert_eq!(file_name_for("Red  \t Oak", PostcardStyle::Card), "Red_Oak_card.png");
        assert_eq!(file_name_for("a/b", PostcardStyle::Postcard), "a_b_postcard.png");
        assert_eq!(file_name_for("", PostcardStyle::Postcard), "untitled_postcard.png");
    }

    #[test]
    fn layout_has_shadow_image_and_two_labels() {
        let list = layout_postcard(&spec(), 1000, 500, &PostcardOptions::default()).unwrap();
        assert!(list
            .commands
            .iter()
            .any(|c| matches!(c, PaintCommand::Shadow { offset: (0, 10), .. })));
        assert!(list.commands.iter().any(|c| matches!(
            c,
            PaintCommand::Image { rect } if rect.x == 90 && rect.y == 95 && rect.width == 420
        )));
        assert_eq!(
            list.texts().collect::<Vec<_>>(),
            vec!["Bald Eagle", "Haliaeetus leucocephalus"]
        );
    }

    #[test]
    fn category_and_shadow_are_optional() {
        let opts = PostcardOptions {
            shadow: false,
            show_category: true,
            ..Default::default()
        };
        let list = layout_postcard(&spec(), 10, 10, &opts).unwrap();
        assert!(!list.commands.iter().any(|c| matches!(c, PaintCommand::Shadow { .. })));
        assert_eq!(list.texts().last(), Some("Aves"));
    }

    #[test]
    fn compose_produces_named_png() {
        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([20, 120, 20, 255])));
        let card = compose(&spec(), &photo, &PostcardOptions::default()).unwrap();
        assert_eq!(card.file_name, "Bald_Eagle_postcard.png");
        assert_eq!((card.image.width, card.image.height), (600, 400));
        assert!(card.data_url().starts_with("data:image/png;base64,iVBOR"));

        let decoded = image::load_from_memory(card.png()).unwrap().to_rgba8();
        // photo center is green, corners stay white
        let center = decoded.get_pixel(300, 200).0;
        assert!(center[1] > center[0] && center[1] > center[2]);
        assert!(decoded.get_pixel(2, 2).0[0] > 250);
    }

    #[test]
    fn card_without_photo_uses_placeholder() {
        let card = TaxonCard {
            common_name: "Mystery".into(),
            scientific_name: "Incertae sedis".into(),
            photo_url: None,
            rank: "species".into(),
            category: None,
        };
        let spec = PostcardSpec::from_card(&card);
        assert_eq!(spec.image_url, crate::view::PLACEHOLDER_PHOTO_URL);
        assert_eq!(spec.category.as_deref(), Some("species"));
    }
}
