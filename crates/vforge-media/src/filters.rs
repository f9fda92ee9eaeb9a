//! FFmpeg video filter definitions.
//!
//! Motion effects are built on `zoompan` over a still filled to the output
//! frame. Panning effects hold a zoom above 1 so the window has room to
//! travel; zoompan clamps `x`/`y` to `[0, iw - iw/zoom]`.

use vforge_models::{EncodingConfig, MotionEffect};

/// Scale-to-fill then center-crop to the output frame.
pub fn fill_frame(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}

/// Filter normalizing arbitrary footage to the segment profile.
pub fn clip_filter(encoding: &EncodingConfig) -> String {
    format!(
        "{},setsar=1,fps={}",
        fill_frame(encoding.width, encoding.height),
        encoding.fps
    )
}

/// Constant zoom for panning effects. The visible window is `1/PAN_ZOOM` of
/// the frame, leaving `iw - iw/zoom` pixels of travel.
pub const PAN_ZOOM: f64 = 1.25;

/// Filter chain animating a still image with `effect` for `frames` frames.
///
/// The still is filled to the output frame first, so every effect keeps the
/// output aspect ratio.
pub fn motion_filter(effect: MotionEffect, frames: u32, encoding: &EncodingConfig) -> String {
    let frames = frames.max(1);
    let (width, height) = (encoding.width, encoding.height);
    let fps = encoding.fps;
    let size = encoding.size_spec();
    let pan = PAN_ZOOM.to_string();
    let centered_x = "iw/2-(iw/zoom/2)";
    let centered_y = "ih/2-(ih/zoom/2)";
    let right = "(iw-iw/zoom)*on/{frames}";
    let left = "(iw-iw/zoom)*(1-on/{frames})";
    let down = "(ih-ih/zoom)*on/{frames}";
    let up = "(ih-ih/zoom)*(1-on/{frames})";

    let zoompan = |z: &str, x: &str, y: &str| {
        format!("zoompan=z='{z}':d={frames}:x='{x}':y='{y}':s={size}:fps={fps}")
    };

    let motion = match effect {
        MotionEffect::ZoomIn => zoompan("min(zoom+0.0015,1.15)", centered_x, centered_y),
        MotionEffect::ZoomOut => zoompan(
            "if(eq(on,0),1.15,max(zoom-0.0015,1.0))",
            centered_x,
            centered_y,
        ),
        MotionEffect::PanLeft => zoompan(&pan, left, centered_y),
        MotionEffect::PanRight => zoompan(&pan, right, centered_y),
        MotionEffect::PanUp => zoompan(&pan, centered_x, up),
        MotionEffect::PanDown => zoompan(&pan, centered_x, down),
        MotionEffect::DiagonalPan => zoompan(&pan, right, down),
        MotionEffect::ZoomInPanRight => zoompan("min(zoom+0.001,1.1)", right, centered_y),
        MotionEffect::SlowZoomRotate => format!(
            "rotate=a='t*0.02':c=black:ow={width}:oh={height},{}",
            zoompan("min(zoom+0.0008,1.08)", centered_x, centered_y)
        ),
        MotionEffect::FadeInZoom => format!(
            "{},fade=t=in:st=0:d=1",
            zoompan("min(zoom+0.0012,1.1)", centered_x, centered_y)
        ),
        MotionEffect::BounceZoom => zoompan("1.0+sin(on/{fps}/2)*0.05", centered_x, centered_y),
        // Orbit around the center within the travel range
        MotionEffect::CircularPan => zoompan(
            &pan,
            "(iw-iw/zoom)/2*(1+sin(2*PI*on/{frames}))",
            "(ih-ih/zoom)/2*(1+cos(2*PI*on/{frames}))",
        ),
    };

    // `{frames}` and `{fps}` inside expressions are literal placeholders until here
    let motion = motion
        .replace("{frames}", &frames.to_string())
        .replace("{fps}", &fps.to_string());

    format!("{},{},setsar=1", fill_frame(width, height), motion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_models::Orientation;

    #[test]
    fn test_clip_filter() {
        let filter = clip_filter(&EncodingConfig::default());
        assert_eq!(
            filter,
            "scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080,setsar=1,fps=30"
        );
    }

    #[test]
    fn test_zoom_in_filter() {
        let filter = motion_filter(MotionEffect::ZoomIn, 300, &EncodingConfig::default());
        assert!(filter.starts_with("scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080,"));
        assert!(filter.contains("zoompan=z='min(zoom+0.0015,1.15)':d=300"));
        assert!(filter.contains(":s=1920x1080:fps=30"));
    }

    #[test]
    fn test_every_effect_fills_output_frame() {
        let encoding = EncodingConfig::default();
        for effect in MotionEffect::PALETTE {
            let filter = motion_filter(*effect, 90, &encoding);
            assert!(
                filter.starts_with("scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080,"),
                "{effect}: {filter}"
            );
        }
    }

    #[test]
    fn test_pan_effects_zoom_past_full_frame() {
        // At zoom 1 the window is the whole frame and x/y clamp to 0
        let encoding = EncodingConfig::default();
        for effect in [
            MotionEffect::PanLeft,
            MotionEffect::PanRight,
            MotionEffect::PanUp,
            MotionEffect::PanDown,
            MotionEffect::DiagonalPan,
            MotionEffect::CircularPan,
        ] {
            let filter = motion_filter(effect, 90, &encoding);
            assert!(filter.contains("zoompan=z='1.25'"), "{effect}: {filter}");
            assert!(!filter.contains("(iw-ow)") && !filter.contains("(ih-oh)"));
        }

        let left = motion_filter(MotionEffect::PanLeft, 90, &encoding);
        assert!(left.contains("x='(iw-iw/zoom)*(1-on/90)'"));
        let down = motion_filter(MotionEffect::PanDown, 90, &encoding);
        assert!(down.contains("y='(ih-ih/zoom)*on/90'"));
    }

    #[test]
    fn test_portrait_output_size() {
        let encoding = EncodingConfig::for_orientation(Orientation::Portrait);
        for effect in MotionEffect::PALETTE {
            let filter = motion_filter(*effect, 150, &encoding);
            assert!(filter.contains("s=1080x1920"), "{effect}: {filter}");
            assert!(!filter.contains("{frames}") && !filter.contains("{fps}"));
        }
    }

    #[test]
    fn test_every_effect_is_distinct() {
        let encoding = EncodingConfig::default();
        let filters: std::collections::HashSet<_> = MotionEffect::PALETTE
            .iter()
            .map(|e| motion_filter(*e, 240, &encoding))
            .collect();
        assert_eq!(filters.len(), MotionEffect::PALETTE.len());
    }

    #[test]
    fn test_fade_in_zoom_appends_fade() {
        let filter = motion_filter(MotionEffect::FadeInZoom, 240, &EncodingConfig::default());
        assert!(filter.contains("fade=t=in:st=0:d=1"));
    }
}
