// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the vision system. It holds the
// single-pixel color heuristics the laser segmentation needs, computed from one RGB
// pixel with no knowledge of neighbors in space or time.
//
// A laser dot on a camera sensor is "bright, saturated, colored light": the brightest
// channel is near clipping, the other channels are far below it, and the hue names the
// pointer color. HSV separates exactly those three questions, so the segmentation
// thresholds are written against it:
// - Value (HSV):      max(R,G,B), 0..255
// - Saturation (HSV): (max - min) / max, scaled to 0..255 and rounded
// - Hue:              angle on the color wheel in degrees [0, 360)
//
// Value and saturation follow the 8-bit HSV convention used by common camera tooling,
// so thresholds tuned on captured footage carry over unchanged. Hue is kept in
// degrees rather than the half-degree byte encoding so color ranges read naturally.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type Hue = f32;
    pub type SaturationHSV = u8;
    pub type ValueHSV = u8;

    /// A pixel expressed in hue/saturation/value.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Hsv {
        /// Hue angle in degrees [0, 360). Zero for achromatic pixels.
        pub hue: Hue,
        /// Colorfulness relative to brightness (0-255).
        pub saturation: SaturationHSV,
        /// Brightness of the strongest channel (0-255).
        pub value: ValueHSV,
    }

    impl Hsv {
        pub fn from_rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let chroma = maximum_channel - minimum_channel;

            let saturation = if maximum_channel == 0 {
                0
            } else {
                ((255 * chroma as u32 + maximum_channel as u32 / 2) / maximum_channel as u32) as u8
            };

            Self {
                hue: hue_degrees(red, green, blue, maximum_channel, chroma),
                saturation,
                value: maximum_channel,
            }
        }
    }

    impl From<&Rgb<u8>> for Hsv {
        fn from(pixel: &Rgb<u8>) -> Self {
            let [red, green, blue] = pixel.0;
            Hsv::from_rgb(red, green, blue)
        }
    }

    /// Hue angle in degrees [0, 360) from byte channels.
    fn hue_degrees(red: Channel, green: Channel, blue: Channel, maximum: Channel, chroma: Channel) -> Hue {
        if chroma == 0 {
            return 0.0;
        }

        let inverse_chroma = 1.0 / chroma as f32;
        let (red, green, blue) = (red as f32, green as f32, blue as f32);

        let (base_difference, sector_offset) = if maximum as f32 == red {
            (green - blue, 0.0)
        } else if maximum as f32 == green {
            (blue - red, 2.0)
        } else {
            (red - green, 4.0)
        };

        let mut hue = (base_difference * inverse_chroma + sector_offset) * 60.0;
        if hue < 0.0 {
            hue += 360.0;
        }
        if hue >= 360.0 {
            hue -= 360.0;
        }
        hue
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::Hsv;

    #[test]
    fn primaries_map_to_their_hues() {
        let red = Hsv::from_rgb(255, 0, 0);
        assert_eq!(red.hue, 0.0);
        assert_eq!(red.saturation, 255);
        assert_eq!(red.value, 255);

        assert_eq!(Hsv::from_rgb(0, 255, 0).hue, 120.0);
        assert_eq!(Hsv::from_rgb(0, 0, 255).hue, 240.0);
    }

    #[test]
    fn magenta_side_of_red_is_near_360() {
        let hsv = Hsv::from_rgb(255, 0, 51);
        assert!(hsv.hue > 340.0 && hsv.hue < 360.0, "hue was {}", hsv.hue);
    }

    #[test]
    fn grays_have_no_saturation() {
        let white = Hsv::from_rgb(255, 255, 255);
        assert_eq!(white.saturation, 0);
        assert_eq!(white.value, 255);
        assert_eq!(white.hue, 0.0);

        let black = Hsv::from_rgb(0, 0, 0);
        assert_eq!(black.saturation, 0);
        assert_eq!(black.value, 0);
    }

    #[test]
    fn saturation_is_rounded_ratio_of_chroma_to_value() {
        // chroma 100 over value 200 -> 127.5 -> 128
        let hsv = Hsv::from_rgb(200, 100, 100);
        assert_eq!(hsv.saturation, 128);
        assert_eq!(hsv.value, 200);
    }
}
