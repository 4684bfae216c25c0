//! Genre blending: weighted combination of two base genres into one.
//!
//! A [`GenreDef`] carries a color (for palette generation downstream), a
//! list of theme tags, and a name prefix. [`blend`] produces a third
//! `GenreDef` whose color is an RGB lerp of the two inputs and whose themes
//! and prefix are a weighted pick -- deterministic given the same inputs
//! and seed, so a `(primary, secondary, weight)` triple always yields the
//! same blended genre.

use rand::Rng;
use seedfall_seed::SubSeed;
use serde::{Deserialize, Serialize};

use crate::content::ContentId;
use crate::error::{GenError, GenResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreDef {
    pub id: ContentId,
    pub name: String,
    pub prefix: String,
    /// `#RRGGBB`.
    pub color_hex: String,
    pub themes: Vec<String>,
}

pub fn blend(primary: &GenreDef, secondary: &GenreDef, weight: f64, seed: SubSeed) -> GenResult<GenreDef> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(GenError::InvalidParams("blend weight must be in [0, 1]".to_owned()));
    }

    let primary_rgb = parse_hex(&primary.color_hex)?;
    let secondary_rgb = parse_hex(&secondary.color_hex)?;
    let blended_rgb = lerp_rgb(primary_rgb, secondary_rgb, weight);

    let prefix = if weight <= 0.5 { primary.prefix.clone() } else { secondary.prefix.clone() };
    let name = format!("{prefix}-{}", if weight <= 0.5 { &secondary.name } else { &primary.name });

    let mut rng = seed.rng();
    let mut themes: Vec<String> = Vec::new();
    let take_primary = ((1.0 - weight) * primary.themes.len() as f64).round() as usize;
    let take_secondary = (weight * secondary.themes.len() as f64).round() as usize;
    themes.extend(primary.themes.iter().take(take_primary).cloned());
    themes.extend(secondary.themes.iter().take(take_secondary).cloned());
    themes.dedup();
    if themes.is_empty() {
        // Degenerate weight (e.g. both counts rounded to zero): fall back to
        // one theme from whichever side dominates, chosen deterministically.
        let pick_primary = rng.gen_bool(1.0 - weight);
        let fallback = if pick_primary { primary.themes.first() } else { secondary.themes.first() };
        if let Some(t) = fallback {
            themes.push(t.clone());
        }
    }

    Ok(GenreDef {
        id: ContentId(seed.value()),
        name,
        prefix,
        color_hex: format_hex(blended_rgb),
        themes,
    })
}

fn parse_hex(s: &str) -> GenResult<(u8, u8, u8)> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 {
        return Err(GenError::InvalidParams(format!("'{s}' is not a 6-digit hex color")));
    }
    let r = u8::from_str_radix(&s[0..2], 16)
        .map_err(|_| GenError::InvalidParams(format!("invalid hex color '{s}'")))?;
    let g = u8::from_str_radix(&s[2..4], 16)
        .map_err(|_| GenError::InvalidParams(format!("invalid hex color '{s}'")))?;
    let b = u8::from_str_radix(&s[4..6], 16)
        .map_err(|_| GenError::InvalidParams(format!("invalid hex color '{s}'")))?;
    Ok((r, g, b))
}

fn format_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), weight: f64) -> (u8, u8, u8) {
    let lerp = |x: u8, y: u8| -> u8 {
        (x as f64 + (y as f64 - x as f64) * weight).round().clamp(0.0, 255.0) as u8
    };
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
