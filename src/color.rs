/// Plain 8-bit RGB colour, independent of any terminal or graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Warning hue for a danger factor in `[0, 1]`: green at 0, red at 1.
    pub fn danger(factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self::new((255.0 * f) as u8, (255.0 * (1.0 - f)) as u8, 0)
    }
}
