pub mod hue;
